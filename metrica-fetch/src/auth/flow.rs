//! Authorization flows.
//!
//! A flow supplies the two pieces of user input the token bootstrap needs:
//! the token itself and whether to keep it. [`InteractiveFlow`] asks on the
//! terminal; [`PresetFlow`] answers from fixed values for headless use.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::FetchError;
use crate::host::browser::open_in_browser;

/// Answers accepted as "yes" to the save prompt (case-insensitive).
const AFFIRMATIVE_ANSWERS: &[&str] = &["y", "yes", "ok", "save"];

/// Returns true if `answer` agrees to save the token.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE_ANSWERS.contains(&answer.as_str())
}

// ============================================================================
// Flow Trait
// ============================================================================

/// Source of the user input needed to obtain a token.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Sends the user to `authorize_url` and returns the token they enter.
    async fn prompt_for_code(&self, authorize_url: &str) -> Result<String, FetchError>;

    /// Asks whether the token should be cached at `path`.
    async fn prompt_for_save_preference(&self, path: &Path) -> Result<bool, FetchError>;
}

// ============================================================================
// Interactive Flow
// ============================================================================

type Input = Box<dyn AsyncBufRead + Send + Unpin>;

/// Opens the authorization page in a browser and reads answers from stdin.
///
/// Prompts go to stderr so that stdout stays free for exported data.
pub struct InteractiveFlow {
    input: Mutex<Input>,
    open_browser: bool,
}

impl InteractiveFlow {
    /// Reads from stdin and opens the browser.
    pub fn new() -> Self {
        Self::with_input(Box::new(BufReader::new(tokio::io::stdin())), true)
    }

    /// Reads answers from `input`; `open_browser` controls the browser launch.
    pub fn with_input(input: Input, open_browser: bool) -> Self {
        Self {
            input: Mutex::new(input),
            open_browser,
        }
    }

    async fn read_answer(&self) -> Result<String, FetchError> {
        let mut input = self.input.lock().await;
        read_line(&mut *input).await
    }
}

impl Default for InteractiveFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InteractiveFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveFlow")
            .field("open_browser", &self.open_browser)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthorizationFlow for InteractiveFlow {
    async fn prompt_for_code(&self, authorize_url: &str) -> Result<String, FetchError> {
        if !(self.open_browser && open_in_browser(authorize_url)) {
            eprintln!("Open this URL to authorize access:\n  {authorize_url}");
        }

        eprint!("Enter the token shown on the page: ");
        let token = self.read_answer().await?;
        debug!(len = token.len(), "Token entered");
        Ok(token)
    }

    async fn prompt_for_save_preference(&self, path: &Path) -> Result<bool, FetchError> {
        eprint!("Save the token to {} for later runs? [y/N]: ", path.display());
        let answer = self.read_answer().await?;
        Ok(is_affirmative(&answer))
    }
}

/// Reads one line, without its line terminator.
///
/// # Errors
///
/// Returns [`FetchError::Authorization`] when the input is closed.
pub(crate) async fn read_line<R>(reader: &mut R) -> Result<String, FetchError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .await
        .map_err(|e| FetchError::Authorization(format!("failed to read input: {e}")))?;

    if read == 0 {
        return Err(FetchError::Authorization("input closed".to_string()));
    }

    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_string())
}

// ============================================================================
// Preset Flow
// ============================================================================

/// Answers both prompts from fixed values.
#[derive(Debug, Clone)]
pub struct PresetFlow {
    token: String,
    save: bool,
}

impl PresetFlow {
    /// Creates a flow that returns `token` and answers `save` to the save prompt.
    pub fn new(token: impl Into<String>, save: bool) -> Self {
        Self {
            token: token.into(),
            save,
        }
    }
}

#[async_trait]
impl AuthorizationFlow for PresetFlow {
    async fn prompt_for_code(&self, authorize_url: &str) -> Result<String, FetchError> {
        debug!(url = %authorize_url, "Using preset token");
        Ok(self.token.clone())
    }

    async fn prompt_for_save_preference(&self, _path: &Path) -> Result<bool, FetchError> {
        Ok(self.save)
    }
}

// ============================================================================
// Tests
// ============================================================================
