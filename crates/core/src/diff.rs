//! Field-level diff primitives shared by every entity kind's translator.
//!
//! An edit stores two sparse snapshots of an entity: `old` holds the live
//! values the submitter saw, `new` holds the values they proposed. Only
//! changed fields are populated. The helpers below build those halves from
//! tri-state input and apply them back onto live entities.

/// Types with one canonical string form (closed enums).
pub trait CanonicalStr {
    fn canonical(&self) -> &'static str;
}

/// Tri-state input field: `None` leaves the field alone, `Some(None)`
/// clears it, `Some(Some(v))` sets it.
pub type FieldInput<T> = Option<Option<T>>;

/// Old/new pair produced for a single scalar field.
pub type FieldChange<T> = (Option<T>, Option<T>);

// ---------------------------------------------------------------------------
// Scalar diffs
// ---------------------------------------------------------------------------

/// Diff a proposed scalar against its live value.
///
/// `old` is populated when the live value is present and the proposal
/// differs from it. `new` is populated when the proposal is present and
/// differs from the live value.
pub fn diff_value<T: PartialEq + Clone>(current: Option<&T>, proposed: &FieldInput<T>) -> FieldChange<T> {
    let Some(proposed) = proposed else {
        return (None, None);
    };
    let proposed = proposed.as_ref();
    if proposed == current {
        return (None, None);
    }
    (current.cloned(), proposed.cloned())
}

/// Diff a string field. Proposals are trimmed and blank strings mean "clear".
pub fn diff_string(current: Option<&str>, proposed: &FieldInput<String>) -> FieldChange<String> {
    let current = current.filter(|s| !s.is_empty()).map(str::to_string);
    let proposed = proposed.as_ref().map(|value| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });
    diff_value(current.as_ref(), &proposed)
}

/// Diff an enum field, comparing canonical string forms.
pub fn diff_enum<E: CanonicalStr + Copy>(current: Option<E>, proposed: &FieldInput<E>) -> FieldChange<E> {
    let Some(proposed) = proposed else {
        return (None, None);
    };
    let same = proposed.map(|e| e.canonical()) == current.map(|e| e.canonical());
    if same {
        return (None, None);
    }
    (current, *proposed)
}

/// Apply one field of an edit onto a live value.
///
/// A populated `new` sets the field. An absent `new` with a populated `old`
/// clears it. Both absent leaves it untouched.
pub fn apply_value<T: Clone>(target: &mut Option<T>, old: &Option<T>, new: &Option<T>) {
    if let Some(value) = new {
        *target = Some(value.clone());
    } else if old.is_some() {
        *target = None;
    }
}

// ---------------------------------------------------------------------------
// List diffs
// ---------------------------------------------------------------------------

/// Compare a proposed list with the live one.
///
/// Returns `(added, removed)`: items in `proposed` but not in `current`, and
/// items in `current` but not in `proposed`. Both outputs are deduplicated
/// and keep their input order.
pub fn slice_compare<T: PartialEq + Clone>(proposed: &[T], current: &[T]) -> (Vec<T>, Vec<T>) {
    let mut added: Vec<T> = Vec::new();
    for item in proposed {
        if !current.contains(item) && !added.contains(item) {
            added.push(item.clone());
        }
    }
    let mut removed: Vec<T> = Vec::new();
    for item in current {
        if !proposed.contains(item) && !removed.contains(item) {
            removed.push(item.clone());
        }
    }
    (added, removed)
}

/// Apply an added/removed delta to a live list. Idempotent.
pub fn apply_list_delta<T: PartialEq + Clone>(list: &mut Vec<T>, added: &[T], removed: &[T]) {
    list.retain(|item| !removed.contains(item));
    for item in added {
        if !list.contains(item) {
            list.push(item.clone());
        }
    }
}

/// Diff an optional proposed list. `None` means "not specified".
pub fn diff_list<T: PartialEq + Clone>(proposed: &Option<Vec<T>>, current: &[T]) -> (Vec<T>, Vec<T>) {
    match proposed {
        Some(proposed) => slice_compare(proposed, current),
        None => (Vec::new(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_field_produces_no_change() {
        assert_eq!(diff_value(Some(&5), &None), (None, None));
    }

    #[test]
    fn equal_field_produces_no_change() {
        assert_eq!(diff_value(Some(&5), &Some(Some(5))), (None, None));
    }

    #[test]
    fn changed_field_records_both_halves() {
        assert_eq!(diff_value(Some(&5), &Some(Some(7))), (Some(5), Some(7)));
    }

    #[test]
    fn clearing_field_records_only_old() {
        assert_eq!(diff_value(Some(&5), &Some(None)), (Some(5), None));
    }

    #[test]
    fn setting_empty_field_records_only_new() {
        assert_eq!(diff_value(None, &Some(Some(7))), (None, Some(7)));
    }

    #[test]
    fn blank_string_proposal_clears() {
        let (old, new) = diff_string(Some("Foo"), &Some(Some("   ".to_string())));
        assert_eq!(old.as_deref(), Some("Foo"));
        assert_eq!(new, None);
    }

    #[test]
    fn trimmed_string_equal_to_live_is_no_change() {
        assert_eq!(diff_string(Some("Foo"), &Some(Some(" Foo ".to_string()))), (None, None));
    }

    #[test]
    fn apply_value_follows_old_new_rules() {
        let mut field = Some(1);
        apply_value(&mut field, &None, &Some(2));
        assert_eq!(field, Some(2));

        apply_value(&mut field, &Some(2), &None);
        assert_eq!(field, None);

        let mut untouched = Some(3);
        apply_value(&mut untouched, &None, &None);
        assert_eq!(untouched, Some(3));
    }

    #[test]
    fn slice_compare_reports_both_directions() {
        let (added, removed) = slice_compare(&["a", "b", "b"], &["b", "c"]);
        assert_eq!(added, vec!["a"]);
        assert_eq!(removed, vec!["c"]);
    }

    #[test]
    fn apply_list_delta_is_idempotent() {
        let mut list = vec!["a", "b"];
        apply_list_delta(&mut list, &["c"], &["a"]);
        apply_list_delta(&mut list, &["c"], &["a"]);
        assert_eq!(list, vec!["b", "c"]);
    }
}
