//! Verb -> registry operation mapping.
//!
//! # Responsibility
//! - Validate a parsed `Command` against the closed type set and the live
//!   registry, then run the matching registry operation.
//! - Render each operation's printable result.
//!
//! # Invariants
//! - Missing arguments are checked in a fixed order: class name, class
//!   validity, instance id, instance lookup, attribute name, value.
//! - The mapping-literal update form skips the value-missing check; the
//!   positional form does not.
//! - A failed check mutates nothing and persists nothing.

use crate::command::{Command, CommandError, UpdateArgs, Verb};
use crate::model::record::{Record, RecordType};
use crate::model::value::{quote_text, AttrPairs};
use crate::repo::registry::Registry;
use crate::store::ObjectStore;

/// Executes commands against one registry.
pub struct Dispatcher<'r, S: ObjectStore> {
    registry: &'r mut Registry<S>,
}

impl<'r, S: ObjectStore> Dispatcher<'r, S> {
    pub fn new(registry: &'r mut Registry<S>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry<S> {
        &*self.registry
    }

    /// Runs `command`; `Ok(Some(text))` is printed, `Ok(None)` prints nothing.
    pub fn execute(&mut self, command: Command) -> Result<Option<String>, CommandError> {
        match command.verb {
            Verb::Create => self.create(&command).map(Some),
            Verb::Show => self.show(&command).map(Some),
            Verb::Destroy => self.destroy(&command).map(|()| None),
            Verb::All => self.all(&command).map(Some),
            Verb::Count => self.count(&command).map(Some),
            Verb::Update => self.update(command).map(|()| None),
        }
    }

    fn create(&mut self, command: &Command) -> Result<String, CommandError> {
        let kind = resolve_type(command)?;
        Ok(self.registry.create(kind)?)
    }

    fn show(&self, command: &Command) -> Result<String, CommandError> {
        let kind = resolve_type(command)?;
        let id = require_id(command)?;
        self.registry
            .get(kind, id)
            .map(Record::render)
            .ok_or(CommandError::InstanceNotFound)
    }

    fn destroy(&mut self, command: &Command) -> Result<(), CommandError> {
        let kind = resolve_type(command)?;
        let id = require_id(command)?;
        self.registry.destroy(kind, id)?;
        Ok(())
    }

    fn all(&self, command: &Command) -> Result<String, CommandError> {
        let filter = match command.type_name.as_deref() {
            None => None,
            Some(name) => Some(RecordType::parse(name).ok_or(CommandError::UnknownClass)?),
        };
        Ok(render_listing(self.registry.records(filter)))
    }

    fn count(&self, command: &Command) -> Result<String, CommandError> {
        let kind = resolve_type(command)?;
        Ok(self.registry.count(kind).to_string())
    }

    fn update(&mut self, command: Command) -> Result<(), CommandError> {
        let kind = resolve_type(&command)?;
        let id = require_id(&command)?.to_string();
        if self.registry.get(kind, &id).is_none() {
            return Err(CommandError::InstanceNotFound);
        }

        let assignments = update_assignments(command.update)?;
        if assignments.is_empty() {
            return Ok(());
        }
        self.registry.update(kind, &id, assignments)?;
        Ok(())
    }
}

fn resolve_type(command: &Command) -> Result<RecordType, CommandError> {
    let name = command
        .type_name
        .as_deref()
        .ok_or(CommandError::MissingClassName)?;
    RecordType::parse(name).ok_or(CommandError::UnknownClass)
}

fn require_id(command: &Command) -> Result<&str, CommandError> {
    command
        .id
        .as_deref()
        .ok_or(CommandError::MissingInstanceId)
}

fn update_assignments(update: UpdateArgs) -> Result<AttrPairs, CommandError> {
    match update {
        UpdateArgs::None | UpdateArgs::Positional { name: None, .. } => {
            Err(CommandError::MissingAttributeName)
        }
        UpdateArgs::Positional {
            name: Some(_),
            value: None,
        } => Err(CommandError::MissingAttributeValue),
        UpdateArgs::Positional {
            name: Some(name),
            value: Some(value),
        } => Ok(vec![(name, value)]),
        UpdateArgs::Dictionary(Ok(pairs)) => Ok(pairs),
        UpdateArgs::Dictionary(Err(err)) => Err(CommandError::InvalidDictionary(err)),
    }
}

/// `["<record>", "<record>"]`, or `[]` when empty.
///
/// Items are quoted like any other display string, so a record holding
/// both quote kinds is single-quoted with escapes.
fn render_listing<'a>(records: impl Iterator<Item = &'a Record>) -> String {
    let items = records
        .map(|record| quote_text(&record.render()))
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::{render_listing, update_assignments, CommandError};
    use crate::command::{LiteralError, UpdateArgs};
    use crate::model::record::{Record, RecordType};
    use crate::model::value::AttrValue;

    #[test]
    fn positional_update_checks_name_then_value() {
        let missing_name = update_assignments(UpdateArgs::Positional {
            name: None,
            value: None,
        });
        assert!(matches!(missing_name, Err(CommandError::MissingAttributeName)));

        let missing_value = update_assignments(UpdateArgs::Positional {
            name: Some("age".to_string()),
            value: None,
        });
        assert!(matches!(missing_value, Err(CommandError::MissingAttributeValue)));
    }

    // The mapping form has no separate value to be missing: an empty mapping
    // is a successful no-op rather than a value-missing error.
    #[test]
    fn dictionary_update_skips_the_value_check() {
        let pairs = update_assignments(UpdateArgs::Dictionary(Ok(Vec::new()))).unwrap();
        assert!(pairs.is_empty());

        let pairs = update_assignments(UpdateArgs::Dictionary(Ok(vec![(
            "a".to_string(),
            AttrValue::Int(1),
        )])))
        .unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn malformed_dictionary_is_reported_as_invalid_format() {
        let err =
            update_assignments(UpdateArgs::Dictionary(Err(LiteralError::UnexpectedEnd))).unwrap_err();
        assert_eq!(err.to_string(), "** invalid dictionary format **");
    }

    #[test]
    fn listing_items_are_unambiguous_when_values_hold_quotes() {
        let plain = Record::new(RecordType::User);
        let listing = render_listing([&plain].into_iter());
        assert_eq!(listing, format!("[\"{plain}\"]"));

        let mut quoted = Record::new(RecordType::User);
        quoted.set_attribute("name", AttrValue::from(r#"say "hi""#));
        let listing = render_listing([&quoted].into_iter());
        assert!(listing.starts_with("['[User] ("), "got {listing}");
        assert!(listing.ends_with(r#"\'name\': \'say "hi"\'}']"#), "got {listing}");

        assert_eq!(render_listing(std::iter::empty()), "[]");
    }
}
