use crate::core::context::RenderContext;

/// A display segment. Renders provider data from the context into text.
///
/// Every component renders an empty string when the data it needs is missing.
pub trait Component: Send + Sync {
    fn render(&self, ctx: &RenderContext) -> String;

    /// Keys of the providers whose output this component reads.
    fn required_providers(&self) -> &[&str];

    /// Lets a component hide itself based on fetched data.
    fn should_render(&self, _ctx: &RenderContext) -> bool {
        true
    }

    /// Marks a layout break rather than a text segment.
    fn is_line_break(&self) -> bool {
        false
    }
}
