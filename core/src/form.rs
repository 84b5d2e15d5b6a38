//! "Add Item" modal: field state, rule-table validation and the create
//! mutation.
//!
//! # Design
//! Validation is a static table of rules per field, checked on blur and on
//! submit. Every failing rule of a field is recorded; the first is the one
//! displayed. The modal never decides its own visibility: the caller passes
//! an `on_close` callback and owns the open flag.
//!
//! Submission is split into `begin_submit` (validate, build the request
//! body, enter the submitting state) and `finish_submit` (apply the
//! server's answer) so a host can run the request however it likes.
//! `submit` does both against the injected `ItemsApi`.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::client::ItemsApi;
use crate::error::ApiError;
use crate::notify::{NotificationService, ToastKind};
use crate::query::{QueryClient, ITEMS};
use crate::translate::handle_error;
use crate::types::{Item, ItemCreate, ItemsPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Description,
    DueDate,
}

impl Field {
    /// Label shown next to the input.
    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::DueDate => "Due Date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Fails on empty or whitespace-only input.
    Required(&'static str),
    /// Fails on non-empty input that is neither `YYYY-MM-DD` nor RFC 3339.
    Date(&'static str),
}

impl Rule {
    fn check(&self, value: &str) -> Option<&'static str> {
        match *self {
            Rule::Required(message) if value.trim().is_empty() => Some(message),
            Rule::Date(message) if !value.trim().is_empty() && to_iso_instant(value).is_none() => {
                Some(message)
            }
            _ => None,
        }
    }
}

pub struct FieldRules {
    pub field: Field,
    pub rules: &'static [Rule],
}

pub const ITEM_FORM_RULES: &[FieldRules] = &[
    FieldRules {
        field: Field::Title,
        rules: &[Rule::Required("Title is required.")],
    },
    FieldRules {
        field: Field::Description,
        rules: &[],
    },
    FieldRules {
        field: Field::DueDate,
        rules: &[Rule::Date("Due date must be a valid date.")],
    },
];

/// Normalize a date picker value to an ISO-8601 instant in UTC with
/// millisecond precision. A bare date means midnight UTC.
pub fn to_iso_instant(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(midnight.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| {
            instant
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFormValues {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

impl ItemFormValues {
    fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::DueDate => &self.due_date,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::DueDate => &mut self.due_date,
        }
    }

    /// Request body for valid values.
    pub fn to_create(&self) -> ItemCreate {
        ItemCreate {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            due_date: to_iso_instant(&self.due_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitBlocked {
    #[error("form has validation errors")]
    Invalid,
    #[error("a submission is already in flight")]
    InFlight,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Created(Item),
    Failed,
    Blocked(SubmitBlocked),
}

pub struct ItemFormModal {
    api: Rc<dyn ItemsApi>,
    queries: QueryClient<ItemsPage>,
    notifier: Rc<dyn NotificationService>,
    on_close: Box<dyn FnMut()>,
    values: ItemFormValues,
    errors: BTreeMap<Field, Vec<&'static str>>,
    submitting: bool,
}

impl ItemFormModal {
    pub fn new(
        api: Rc<dyn ItemsApi>,
        queries: QueryClient<ItemsPage>,
        notifier: Rc<dyn NotificationService>,
        on_close: impl FnMut() + 'static,
    ) -> Self {
        Self {
            api,
            queries,
            notifier,
            on_close: Box::new(on_close),
            values: ItemFormValues::default(),
            errors: BTreeMap::new(),
            submitting: false,
        }
    }

    pub fn values(&self) -> &ItemFormValues {
        &self.values
    }

    pub fn set_value(&mut self, field: Field, value: impl Into<String>) {
        *self.values.get_mut(field) = value.into();
    }

    pub fn blur(&mut self, field: Field) {
        self.validate_field(field);
    }

    /// The message shown next to `field`, if any.
    pub fn error(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).and_then(|messages| messages.first().copied())
    }

    /// Every failing criterion of `field`.
    pub fn errors(&self, field: Field) -> &[&'static str] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn reset(&mut self) {
        self.values = ItemFormValues::default();
        self.errors.clear();
    }

    /// Close without touching the entered values.
    pub fn cancel(&mut self) {
        (self.on_close)();
    }

    pub fn begin_submit(&mut self) -> Result<ItemCreate, SubmitBlocked> {
        if self.submitting {
            return Err(SubmitBlocked::InFlight);
        }
        let mut valid = true;
        for rules in ITEM_FORM_RULES {
            valid &= self.validate_field(rules.field);
        }
        if !valid {
            debug!(errors = ?self.errors, "create item blocked by validation");
            return Err(SubmitBlocked::Invalid);
        }
        self.submitting = true;
        Ok(self.values.to_create())
    }

    /// Apply the server's answer to a submission started with
    /// `begin_submit`. The items cache is invalidated either way.
    pub fn finish_submit(&mut self, result: Result<Item, ApiError>) -> SubmitOutcome {
        self.submitting = false;
        let outcome = match result {
            Ok(item) => {
                info!(id = %item.id, "item created");
                self.notifier
                    .show_toast("Success!", "Item created successfully.", ToastKind::Success);
                self.reset();
                (self.on_close)();
                SubmitOutcome::Created(item)
            }
            Err(err) => {
                handle_error(&err, self.notifier.as_ref());
                SubmitOutcome::Failed
            }
        };
        self.queries.invalidate_queries(ITEMS);
        outcome
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        match self.begin_submit() {
            Ok(body) => {
                let result = self.api.create_item(&body);
                self.finish_submit(result)
            }
            Err(blocked) => SubmitOutcome::Blocked(blocked),
        }
    }

    fn validate_field(&mut self, field: Field) -> bool {
        let value = self.values.get(field);
        let failures: Vec<&'static str> = ITEM_FORM_RULES
            .iter()
            .filter(|rules| rules.field == field)
            .flat_map(|rules| rules.rules.iter())
            .filter_map(|rule| rule.check(value))
            .collect();
        if failures.is_empty() {
            self.errors.remove(&field);
            true
        } else {
            self.errors.insert(field, failures);
            false
        }
    }
}
