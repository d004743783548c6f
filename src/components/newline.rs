use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};

pub const NAME: &str = "newline";

/// Starts a new output line; separators are not placed around it.
pub struct NewlineComponent;

impl Component for NewlineComponent {
    fn render(&self, _ctx: &RenderContext) -> String {
        "\n".to_string()
    }

    fn required_providers(&self) -> &[&str] {
        &[]
    }

    fn is_line_break(&self) -> bool {
        true
    }
}

fn create(_config: &Reader) -> Box<dyn Component> {
    Box::new(NewlineComponent)
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::empty_context;

    #[test]
    fn is_a_line_break() {
        let c = create(&Reader::empty());
        assert!(c.is_line_break());
        assert!(c.required_providers().is_empty());
        assert_eq!(c.render(&empty_context()), "\n");
    }
}
