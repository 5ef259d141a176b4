//! Mock runner and UI driver for deterministic testing.
//!
//! Both record what they were asked to do and answer from pre-configured
//! rules, so tool dispatch, the proxy handshake, and the clicker can be
//! exercised without a device.

use anthroid_core::{AnthroidError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::runner::{CommandOutput, CommandRunner, Invocation};
use crate::ui::{UiDriver, UiElement};

/// What a [`MockRunner`] rule answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    Output(CommandOutput),
    /// The program could not be started.
    LaunchError,
    Timeout,
}

type Hook = Arc<dyn Fn(&Invocation) + Send + Sync>;

struct Rule {
    pattern: String,
    reply: MockReply,
    hook: Option<Hook>,
}

/// A [`CommandRunner`] that matches invocations by substring.
///
/// # Example
/// ```
/// use anthroid_device::mock::MockRunner;
/// let runner = MockRunner::new()
///     .with_stdout("pm list packages", "package:com.example.app\n");
/// ```
pub struct MockRunner {
    rules: Vec<Rule>,
    /// Track every invocation received (for assertions in tests).
    pub invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer invocations containing `pattern` with the given stdout.
    pub fn with_stdout(self, pattern: &str, stdout: &str) -> Self {
        self.with_reply(pattern, MockReply::Output(CommandOutput::stdout(stdout)))
    }

    pub fn with_reply(mut self, pattern: &str, reply: MockReply) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            reply,
            hook: None,
        });
        self
    }

    /// Run `hook` whenever an invocation containing `pattern` arrives, then
    /// answer with empty output. Used to play the companion app.
    pub fn with_hook(
        mut self,
        pattern: &str,
        hook: impl Fn(&Invocation) + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            reply: MockReply::Output(CommandOutput::stdout("")),
            hook: Some(Arc::new(hook)),
        });
        self
    }

    /// Display strings of every invocation so far.
    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(Invocation::display)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    fn shell(&self) -> &str {
        "sh"
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn exec(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let display = invocation.display();

        let Some(rule) = self.rules.iter().find(|r| display.contains(&r.pattern)) else {
            return Ok(CommandOutput::stdout(""));
        };
        if let Some(ref hook) = rule.hook {
            hook(invocation);
        }
        match &rule.reply {
            MockReply::Output(out) => Ok(out.clone()),
            MockReply::LaunchError => Err(AnthroidError::CommandLaunch {
                program: invocation.program.clone(),
                reason: "No such file or directory (os error 2)".into(),
            }),
            MockReply::Timeout => Err(AnthroidError::CommandTimeout {
                program: invocation.program.clone(),
                timeout: invocation.timeout,
            }),
        }
    }
}

/// A [`UiDriver`] serving scripted screens.
///
/// Screens queued with [`MockUiDriver::push_screen`] are served once each, in
/// order; after that the resting screen is served on every poll.
pub struct MockUiDriver {
    screens: Mutex<VecDeque<Vec<UiElement>>>,
    resting: Vec<UiElement>,
    /// Texts whose clicks fail.
    failing: Vec<String>,
    /// Track every clicked element (for assertions in tests).
    pub clicks: Arc<Mutex<Vec<UiElement>>>,
}

impl MockUiDriver {
    pub fn new(resting: Vec<UiElement>) -> Self {
        Self {
            screens: Mutex::new(VecDeque::new()),
            resting,
            failing: Vec::new(),
            clicks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_screen(self, elements: Vec<UiElement>) -> Self {
        self.screens.lock().unwrap().push_back(elements);
        self
    }

    /// Make clicks on elements with exactly this text fail.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.push(text.to_string());
        self
    }

    /// Texts of the clicked elements, in order.
    pub fn clicked_texts(&self) -> Vec<String> {
        self.clicks
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }
}

/// A clickable button with the given text.
pub fn button(text: &str) -> UiElement {
    UiElement {
        text: text.to_string(),
        class: "android.widget.Button".into(),
        clickable: true,
        bounds: (0, 0, 200, 100),
        ..Default::default()
    }
}

/// A non-clickable label with the given text.
pub fn label(text: &str) -> UiElement {
    UiElement {
        text: text.to_string(),
        class: "android.widget.TextView".into(),
        clickable: false,
        bounds: (0, 100, 200, 150),
        ..Default::default()
    }
}

#[async_trait]
impl UiDriver for MockUiDriver {
    async fn device_name(&self) -> Result<String> {
        Ok("mock-device".into())
    }

    async fn elements(&self) -> Result<Vec<UiElement>> {
        let next = self.screens.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.resting.clone()))
    }

    async fn click(&self, element: &UiElement) -> Result<()> {
        if self.failing.contains(&element.text) {
            return Err(AnthroidError::UiAutomation(format!(
                "element '{}' went stale",
                element.text
            )));
        }
        self.clicks.lock().unwrap().push(element.clone());
        Ok(())
    }
}
