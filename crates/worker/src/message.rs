//! Command messages delivered through an actor inbox.

use std::fmt;
use std::sync::Arc;

/// Integer command code carried by every [`Message`].
///
/// Codes are actor-specific except [`MessageType::SHUTDOWN`], which the
/// runtime intercepts before it can reach [`crate::Actor::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(pub u32);

impl MessageType {
	/// Reserved code that terminates the run-loop.
	pub const SHUTDOWN: Self = Self(0);

	/// Returns `true` for the reserved shutdown code.
	pub const fn is_shutdown(self) -> bool {
		self.0 == Self::SHUTDOWN.0
	}
}

impl From<u32> for MessageType {
	fn from(code: u32) -> Self {
		Self(code)
	}
}

impl fmt::Display for MessageType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_shutdown() { f.write_str("SHUTDOWN") } else { write!(f, "{}", self.0) }
	}
}

/// Opaque sender tag attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(Arc<str>);

impl Origin {
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Origin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One immutable command.
#[derive(Debug, Clone)]
pub struct Message<D> {
	kind: MessageType,
	origin: Option<Origin>,
	data: Option<D>,
}

impl<D> Message<D> {
	pub fn new(kind: impl Into<MessageType>, origin: Option<Origin>, data: Option<D>) -> Self {
		Self {
			kind: kind.into(),
			origin,
			data,
		}
	}

	pub fn kind(&self) -> MessageType {
		self.kind
	}

	pub fn origin(&self) -> Option<&Origin> {
		self.origin.as_ref()
	}

	pub fn data(&self) -> Option<&D> {
		self.data.as_ref()
	}

	/// Consumes the message, returning its payload.
	pub fn into_data(self) -> Option<D> {
		self.data
	}
}
