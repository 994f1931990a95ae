// self
use crate::{
	_prelude::*,
	error::{IdentityError, RefreshError},
	obs::FlowKind,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by the flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("tesla_oauth2.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> FlowSpanGuard {
		#[cfg(feature = "tracing")]
		{
			FlowSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			FlowSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`FlowSpan::entered`].
pub struct FlowSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}

/// Reports a user-info failure that was degraded into an empty identity.
pub(crate) fn warn_identity_degraded(err: &IdentityError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			error = %err,
			body = err.provider_body().unwrap_or_default(),
			"Failed to fetch Tesla user info; continuing with an empty identity."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Reports a failed refresh attempt; the caller still receives the error.
pub(crate) fn warn_refresh_failed(err: &RefreshError) {
	#[cfg(feature = "tracing")]
	{
		let body = match err {
			RefreshError::TokenEndpoint(inner) => inner.provider_body(),
			RefreshError::Config(_) => None,
		};

		tracing::warn!(
			error = %err,
			terminal = err.is_terminal(),
			body = body.unwrap_or_default(),
			"Failed to refresh Tesla access token."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}
