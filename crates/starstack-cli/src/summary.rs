use console::Style;
use starstack_core::stack::{AlignMode, StackConfig};

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

pub fn print_stack_summary(config: &StackConfig, frame_count: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Starstack"));
    println!("  {}", s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(frame_count)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Sky subtract"),
        if config.subtract_sky {
            s.method.apply_to("on".to_string())
        } else {
            s.disabled.apply_to("off".to_string())
        }
    );
    let align = match &config.align {
        AlignMode::None => "none".to_string(),
        AlignMode::Template { config, .. } => format!(
            "template (range {}, scale {})",
            config.match_range, config.scale_factor
        ),
        AlignMode::Stars { seeds, config } => format!(
            "stars ({} seeds, maxmove {}, rotation {})",
            seeds.len(),
            config.maxmove,
            if config.rotate { "on" } else { "off" }
        ),
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("Alignment"),
        s.method.apply_to(align)
    );
    println!();
}
