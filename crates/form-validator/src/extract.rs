//! Value extraction by field type

use crate::error::ValidatorError;
use crate::field::{Field, FieldKind};
use crate::value::{FieldValue, Item};

/// Read the current value of a field from its widgets.
///
/// Fails only when a widget has been removed from the document.
pub fn extract(field: &Field) -> Result<FieldValue, ValidatorError> {
    let controls = field.controls();
    if controls.iter().any(|control| !control.is_connected()) {
        return Err(ValidatorError::Detached {
            field: field.name.clone(),
        });
    }
    let Some(first) = controls.first() else {
        return Ok(field.value.clone());
    };

    let value = match field.kind {
        FieldKind::File => match first.files() {
            Some(files) if !files.is_empty() => {
                FieldValue::Many(files.into_iter().map(Item::File).collect())
            }
            _ => FieldValue::text(first.value()),
        },
        FieldKind::Radio => controls
            .iter()
            .find(|control| control.checked())
            .map_or(FieldValue::Null, |control| FieldValue::text(control.value())),
        FieldKind::Checkbox => FieldValue::many(
            controls
                .iter()
                .filter(|control| control.checked())
                .map(|control| Item::Text(control.value()))
                .collect(),
        ),
        FieldKind::Select if first.multiple() => FieldValue::many(
            first
                .selected_values()
                .into_iter()
                .map(Item::Text)
                .collect(),
        ),
        FieldKind::Select => FieldValue::text(first.value()),
        FieldKind::Other(_) => FieldValue::text(first.value()),
    };
    Ok(value)
}
