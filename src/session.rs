//! Scoped access to a [`TrustRoot`].
//!
//! A [`Session`] is a guard: it exists from the moment the first protocol
//! step is attempted, and tears the trust root down exactly once, either
//! through [`Session::close`] or when dropped. Teardown failures are logged
//! and never take the place of the error which ended the session.

use crate::errors::{Error, SessionError};
use crate::trustroot::TrustRoot;
use log::{debug, error};
use std::result;

pub struct Session<'a, T: TrustRoot + ?Sized> {
    root: &'a mut T,
    closed: bool,
}

impl<'a, T: TrustRoot + ?Sized> Session<'a, T> {
    // open walks the trust root through context creation, connect and
    // object handle acquisition. On failure the partially opened session
    // is torn down before returning.
    pub fn open(root: &'a mut T) -> result::Result<Self, SessionError> {
        let session = Session {
            root,
            closed: false,
        };
        session
            .root
            .create_context()
            .map_err(SessionError::ContextCreateFailed)?;
        session
            .root
            .connect()
            .map_err(SessionError::ConnectFailed)?;
        session
            .root
            .get_tpm_object()
            .map_err(SessionError::ObjectHandleFailed)?;
        debug!("session opened");
        Ok(session)
    }

    pub fn root(&mut self) -> &mut T {
        &mut *self.root
    }

    // close frees all memory bound to the context, then closes it
    pub fn close(mut self) -> result::Result<(), SessionError> {
        self.teardown()
    }

    fn teardown(&mut self) -> result::Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let freed = self.root.free_memory();
        if let Err(err) = &freed {
            error!("Failed to free memory: {}", err);
        }
        let closed = self.root.close();
        if let Err(err) = &closed {
            error!("Failed to close context: {}", err);
        }
        debug!("session closed");
        freed.and(closed).map_err(SessionError::TeardownFailed)
    }
}

impl<T: TrustRoot + ?Sized> Drop for Session<'_, T> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

// with_session opens a session on root, runs op in it and tears the
// session down. The result is the one of op: teardown failures are only
// reported as diagnostics.
pub fn with_session<T, R, F>(root: &mut T, op: F) -> result::Result<R, Error>
where
    T: TrustRoot + ?Sized,
    F: FnOnce(&mut Session<T>) -> result::Result<R, Error>,
{
    let mut session = Session::open(root)?;
    let result = op(&mut session);
    let _ = session.close();
    result
}
