use std::{
    io,
    ops::{Deref, DerefMut},
};

use solio_driver::{AsRawFd, Key};

use crate::Runtime;

/// Attach an fd-owning source to the driver of the current runtime.
///
/// Registration happens once, at construction. On drop the registration is
/// removed first and the source (which closes the fd) afterwards.
#[derive(Debug)]
pub struct Attacher<S: AsRawFd> {
    source: S,
    key: Key,
}

impl<S: AsRawFd> Attacher<S> {
    /// Register `source` with the current runtime's driver.
    ///
    /// ## Panics
    ///
    /// Panics when called outside a runtime.
    pub fn new(source: S) -> io::Result<Self> {
        let key = Runtime::with_current(|r| r.register(source.as_raw_fd()))?;
        Ok(Self { source, key })
    }

    /// The registration token, for submitting ops on this fd.
    pub fn key(&self) -> Key {
        self.key
    }
}

impl<S: AsRawFd> Deref for Attacher<S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.source
    }
}

impl<S: AsRawFd> DerefMut for Attacher<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.source
    }
}

impl<S: AsRawFd> Drop for Attacher<S> {
    fn drop(&mut self) {
        // Outside a runtime there is nothing to detach from: the driver,
        // and the kernel registration with it, are already gone.
        let _ = Runtime::try_with_current(|r| {
            let _ = r.deregister(self.key);
        });
    }
}
