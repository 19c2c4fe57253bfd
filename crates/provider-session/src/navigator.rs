//! Navigation capability
//!
//! Sending the user to a login page is host-specific: a browser changes its
//! location, a CLI prints the URL, a server answers with a redirect. The
//! session manager only asks for "go here".

use std::sync::Arc;

use crate::error::Result;

pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str) -> Result<()>;
}

impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    fn navigate(&self, url: &str) -> Result<()> {
        (**self).navigate(url)
    }
}
