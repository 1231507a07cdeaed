use chrono::Local;
use popderive::{Derivation, Event, Options, Outcome, Tree};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub struct ReportStyle {
    pub color: bool,
    pub features: bool,
}

pub fn print_header(source: &str, options: &Options, count: usize, style: &ReportStyle) {
    let palette = ansi::Palette::new(style.color);
    println!(
        "\n{}",
        palette.bold(palette.paint(format!("⚙  PoP derivations: {source}"), ansi::CYAN))
    );
    let range = match (options.start, options.finish) {
        (None, None) => "all".to_string(),
        (start, finish) => format!(
            "{}..={}",
            start.map_or_else(|| "1".to_string(), |s| s.to_string()),
            finish.map_or_else(|| "end".to_string(), |f| f.to_string())
        ),
    };
    println!(
        "  {} {}  {} {}  {} {}",
        palette.dim("started:"),
        palette.paint(Local::now().format("%Y-%m-%d %H:%M:%S").to_string(), ansi::GRAY),
        palette.dim("range:"),
        palette.paint(range, ansi::YELLOW),
        palette.dim("derivations:"),
        palette.paint(count.to_string(), ansi::BLUE),
    );
}

pub fn print_derivation(derivation: &Derivation, style: &ReportStyle) {
    let palette = ansi::Palette::new(style.color);

    let title = match (derivation.number, &derivation.sentence) {
        (Some(number), Some(sentence)) => format!("({number}) {sentence}"),
        _ => "derivation".to_string(),
    };
    println!(
        "\n{} {}",
        palette.bold(palette.paint(title, ansi::CYAN)),
        palette.dim(format!("[{}]", derivation.language))
    );
    println!("{}", palette.paint("━━━ Log ━━━", ansi::GRAY));

    for event in &derivation.events {
        if event.is_counter() || matches!(event, Event::Sentence { .. }) {
            continue;
        }
        println!("  {}", fmt_event(event, &palette, style.features));
    }

    println!("{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    let outcome = match derivation.outcome {
        Outcome::Transferred => palette.paint("✓ transferred", ansi::GREEN),
        Outcome::Crashed(kind) => palette.paint(format!("✗ crashed ({kind:?})"), ansi::RED),
        Outcome::Empty => palette.dim("nothing merged"),
    };
    println!("  {outcome}");
    if let Some(root) = &derivation.root {
        println!("  {} {}", palette.dim("tree:"), render_tree(root, style.features));
    }
    println!(
        "  {} {}  {} {}  {} {}  {} {}",
        palette.dim("merges:"),
        palette.paint(derivation.counters.merges.to_string(), ansi::BLUE),
        palette.dim("inheritances:"),
        palette.paint(derivation.counters.inheritances.to_string(), ansi::BLUE),
        palette.dim("checks:"),
        palette.paint(derivation.counters.checks.to_string(), ansi::BLUE),
        palette.dim("time:"),
        palette.paint(format!("{:?}", derivation.elapsed), ansi::GREEN),
    );
}

/// Raw tuple output, one record per line.
pub fn print_tuples(derivation: &Derivation) {
    for record in derivation.records() {
        println!("{record}");
    }
}

fn render_tree(tree: &Tree, features: bool) -> String {
    if features { tree.full() } else { tree.to_string() }
}

fn fmt_event(event: &Event, palette: &ansi::Palette, features: bool) -> String {
    let record = event.record();
    let color = match event {
        Event::Merge { .. } => ansi::BLUE,
        Event::Label { .. } => ansi::GREEN,
        Event::PassFeatures { .. } | Event::FeaturesPassed(_) | Event::PhiPassing => ansi::MAGENTA,
        Event::CheckedFeatures(_) | Event::Unification(_) => ansi::YELLOW,
        Event::Crash { .. } => ansi::RED,
        _ => ansi::CYAN,
    };
    let payload = match event {
        Event::Label { tree: Some(tree), .. }
        | Event::Transfer(Some(tree))
        | Event::DephaseV(tree)
        | Event::DephaseDeleteC(tree)
        | Event::Crash { tree, .. } => render_tree(tree, features),
        _ => record.payload,
    };
    format!("{:<26} {}", palette.paint(&record.tag, color), payload)
}
