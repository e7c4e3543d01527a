use crate::QueryIndex;

/// A response body together with the version index the server reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed<T> {
    pub value: T,
    pub index: QueryIndex,
}

impl<T> Indexed<T> {
    pub fn new(value: T, index: QueryIndex) -> Self {
        Self { value, index }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Indexed<U> {
        Indexed {
            value: f(self.value),
            index: self.index,
        }
    }
}
