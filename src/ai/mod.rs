/// AI module for Tech Compass
///
/// Talks to the hosted Gemini model and turns its replies into transcript
/// entries.
///
/// # Architecture
///
/// - `client` - `CompassAI` and the per-flow `ChatSession`
/// - `providers` - transport seam and the Gemini REST implementation
/// - `response` - suggestions directive and citation extraction
/// - `timeout` - bounded wait on a model reply
/// - `error` - error type and user-facing failure classification
///
/// # Usage
///
/// ```rust,no_run
/// use tech_compass::ai::CompassAI;
/// use tech_compass::config::AppConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let ai = CompassAI::from_config(&AppConfig::from_env()?);
/// let mut session = ai.start_session();
/// let reply = session.send_message("My printer won't print", None).await?;
/// println!("{}", reply.text);
/// # Ok(())
/// # }
/// ```
mod client;
mod error;
pub mod providers;
pub mod response;
mod timeout;

// Re-export main types
pub use client::{ChatSession, CompassAI};
pub use error::{ChatError, ChatResult, FailureKind, classify};
pub use timeout::with_timeout;
