// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::obs::Operation;

/// Span wrapper shared by token-lifecycle and request code.
#[derive(Clone, Debug)]
pub struct OperationSpan(Span);
impl OperationSpan {
	/// Creates a span tagged with `operation` and the call-site `stage`.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		Self(tracing::info_span!("spotifyle_client.operation", operation = operation.as_str(), stage))
	}

	/// Instruments a future without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.0.clone())
	}

	/// Underlying tracing span.
	pub fn span(&self) -> &Span {
		&self.0
	}
}
