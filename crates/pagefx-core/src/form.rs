#![forbid(unsafe_code)]

//! Required-field validation on submit.

use crate::dom::Dom;

/// Outcome of validating one form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormReport {
    pub checked: usize,
    pub invalid: usize,
}

impl FormReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid == 0
    }
}

/// Mark every required field of `form` as valid or invalid.
///
/// A field is invalid when its trimmed value is empty. Invalid fields gain
/// `error_class`; valid ones lose it.
pub fn validate<D: Dom>(dom: &D, form: &D::Node, required: &str, error_class: &str) -> FormReport {
    let mut report = FormReport::default();
    for field in dom.query_within(form, required) {
        report.checked += 1;
        let filled = dom
            .value(&field)
            .is_some_and(|v| !v.trim().is_empty());
        if filled {
            dom.remove_class(&field, error_class);
        } else {
            dom.add_class(&field, error_class);
            report.invalid += 1;
        }
    }
    report
}
