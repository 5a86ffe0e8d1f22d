//! Capability tags.
//!
//! A capability names a role a receiver candidate (a model node or a bound
//! view) can play, such as "clickable" or "accepts drops". Capabilities are
//! plain interned names so they can be declared as constants next to the code
//! that handles them:
//!
//! ```
//! use trellis_core::Capability;
//!
//! const CLICK: Capability = Capability::new("click");
//! assert_eq!(CLICK.name(), "click");
//! ```

use std::fmt;

/// A named receiver role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capability(&'static str);

impl Capability {
    /// Declare a capability.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The capability's name.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
