use std::ops::{Deref, DerefMut};

use super::Close;

/// Closes the wrapped resource when it goes out of scope.
///
/// Guards are dropped in reverse declaration order, so a connection
/// opened after its transport is always closed before it.
pub struct CloseOnDrop<T: Close> {
    inner: T,
}

impl<T: Close> CloseOnDrop<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Close> Deref for CloseOnDrop<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Close> DerefMut for CloseOnDrop<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Close> Drop for CloseOnDrop<T> {
    fn drop(&mut self) {
        self.inner.close();
    }
}
