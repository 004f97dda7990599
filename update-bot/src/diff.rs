use crate::types::Titled;

/// Decides whether two items observed on different pulls are the same item.
pub trait EqualityPolicy<T>: Send + Sync {
    fn same(&self, previous: &T, fresh: &T) -> bool;
}

/// Whole-value equality: any changed field makes the item new.
#[derive(Debug, Clone, Copy, Default)]
pub struct Structural;

impl<T: PartialEq> EqualityPolicy<T> for Structural {
    fn same(&self, previous: &T, fresh: &T) -> bool {
        previous == fresh
    }
}

/// Title equality: items sharing a title are duplicates whatever else differs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByTitle;

impl<T: Titled> EqualityPolicy<T> for ByTitle {
    fn same(&self, previous: &T, fresh: &T) -> bool {
        previous.title() == fresh.title()
    }
}

impl<T, F> EqualityPolicy<T> for F
where
    F: Fn(&T, &T) -> bool + Send + Sync,
{
    fn same(&self, previous: &T, fresh: &T) -> bool {
        self(previous, fresh)
    }
}

/// Items of `fresh` that match nothing in `previous`, in `fresh` order.
///
/// Each fresh item is only compared against `previous`, never against other
/// fresh items, so two equal items that are both absent from `previous` are
/// both returned.
pub fn difference<T, P>(previous: &[T], fresh: &[T], policy: &P) -> Vec<T>
where
    T: Clone,
    P: EqualityPolicy<T> + ?Sized,
{
    fresh
        .iter()
        .filter(|item| !previous.iter().any(|old| policy.same(old, item)))
        .cloned()
        .collect()
}
