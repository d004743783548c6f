use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Reader;
use crate::core::component::Component;
use crate::core::context::RenderContext;
use crate::core::provider::{Payload, ProvideContext, Provider, ProviderError, ProviderKey};
use crate::display::paint;

pub const DEFAULT_SEPARATOR: &str = " | ";
pub const DEFAULT_SEPARATOR_COLOR: &str = "gray";
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

type Report = (ProviderKey, Result<Payload, ProviderError>);

/// One render pass: providers run concurrently, components render in list order.
pub struct StatusLine {
    providers: Vec<Arc<dyn Provider>>,
    components: Vec<Box<dyn Component>>,
    config: Arc<Reader>,
    separator: String,
    separator_color: String,
    timeout: Duration,
}

impl StatusLine {
    pub fn new(config: Arc<Reader>) -> Self {
        let separator = config.get("display.separator", DEFAULT_SEPARATOR.to_string());
        let separator_color =
            config.get("display.separator_color", DEFAULT_SEPARATOR_COLOR.to_string());
        let timeout = Duration::from_millis(config.get("display.timeout", DEFAULT_TIMEOUT_MS));
        Self {
            providers: Vec::new(),
            components: Vec::new(),
            config,
            separator,
            separator_color,
            timeout,
        }
    }

    pub fn add_provider(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(provider);
    }

    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn render(&self, ctx: &ProvideContext) -> String {
        let render_ctx = self.gather(ctx);
        self.compose(&render_ctx)
    }

    /// Run every provider on its own thread and collect what arrives before the deadline.
    ///
    /// Providers still running at the deadline are abandoned: the shared
    /// context is cancelled and their slots stay empty.
    pub fn gather(&self, ctx: &ProvideContext) -> RenderContext {
        let render_ctx = RenderContext::new(Arc::clone(&self.config));
        if self.providers.is_empty() {
            return render_ctx;
        }

        let ctx = ctx.child_with_timeout(self.timeout);
        let (tx, rx) = mpsc::channel::<Report>();
        let mut pending = 0usize;

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let tx = tx.clone();
            let ctx = ctx.clone();
            let key = provider.key();
            let spawned = thread::Builder::new()
                .name(format!("provider-{key}"))
                .spawn(move || {
                    let result = provider.provide(&ctx);
                    let _ = tx.send((provider.key(), result));
                });
            match spawned {
                Ok(_) => pending += 1,
                Err(e) => {
                    debug!(provider = %key, error = %e, "failed to spawn provider thread");
                    render_ctx.set_error(key, ProviderError::Io(e));
                }
            }
        }
        drop(tx);

        while pending > 0 {
            let received = match ctx.remaining() {
                Some(left) => rx.recv_timeout(left),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((key, Ok(data))) => {
                    pending -= 1;
                    render_ctx.set(key, data);
                }
                Ok((key, Err(e))) => {
                    pending -= 1;
                    debug!(provider = %key, error = %e, "provider failed");
                    render_ctx.set_error(key, e);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(pending, timeout = ?self.timeout, "providers missed the render deadline");
                    ctx.cancel();
                    break;
                }
                // A provider thread panicked and dropped its sender.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        render_ctx
    }

    /// Render components in order and join the non-empty pieces.
    ///
    /// Line breaks split the output into lines; separators never touch a
    /// break and empty lines are dropped.
    pub fn compose(&self, ctx: &RenderContext) -> String {
        let mut lines: Vec<Vec<String>> = vec![Vec::new()];
        for component in &self.components {
            if !component.should_render(ctx) {
                continue;
            }
            if component.is_line_break() {
                lines.push(Vec::new());
                continue;
            }
            let out = component.render(ctx);
            if out.is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                line.push(out);
            }
        }

        let separator = paint(&self.separator, &self.separator_color);
        lines
            .into_iter()
            .filter(|line| !line.is_empty())
            .map(|line| line.join(&separator))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
