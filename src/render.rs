//! Purpose: Pretty JSON rendering with optional ANSI colors for CLI output.
//! Exports: `render_json`.
//! Role: Pure formatter shared by stdout emission paths in the binary.
//! Invariants: Without color the output equals `serde_json::to_string_pretty`.
use serde_json::{Map, Value};

const INDENT: &str = "  ";

#[derive(Clone, Copy)]
enum Tone {
    Key,
    Text,
    Number,
    Literal,
    Plain,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Key => "36",
            Tone::Text => "32",
            Tone::Number => "33",
            Tone::Literal => "35",
            Tone::Plain => "39",
        }
    }
}

struct Painter {
    color: bool,
    out: String,
}

pub fn render_json(value: &Value, color: bool) -> String {
    let mut painter = Painter {
        color,
        out: String::new(),
    };
    painter.value(value, 0);
    painter.out
}

impl Painter {
    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.paint("null", Tone::Plain),
            Value::Bool(flag) => self.paint(if *flag { "true" } else { "false" }, Tone::Literal),
            Value::Number(number) => self.paint(&number.to_string(), Tone::Number),
            Value::String(text) => self.paint(&quote(text), Tone::Text),
            Value::Array(items) => self.array(items, depth),
            Value::Object(map) => self.object(map, depth),
        }
    }

    fn array(&mut self, items: &[Value], depth: usize) {
        if items.is_empty() {
            return self.paint("[]", Tone::Plain);
        }
        self.paint("[", Tone::Plain);
        for (idx, item) in items.iter().enumerate() {
            self.open_line(idx, depth + 1);
            self.value(item, depth + 1);
        }
        self.close_line(depth);
        self.paint("]", Tone::Plain);
    }

    fn object(&mut self, map: &Map<String, Value>, depth: usize) {
        if map.is_empty() {
            return self.paint("{}", Tone::Plain);
        }
        self.paint("{", Tone::Plain);
        for (idx, (key, value)) in map.iter().enumerate() {
            self.open_line(idx, depth + 1);
            self.paint(&quote(key), Tone::Key);
            self.paint(":", Tone::Plain);
            self.out.push(' ');
            self.value(value, depth + 1);
        }
        self.close_line(depth);
        self.paint("}", Tone::Plain);
    }

    fn open_line(&mut self, idx: usize, depth: usize) {
        if idx > 0 {
            self.paint(",", Tone::Plain);
        }
        self.out.push('\n');
        self.out.push_str(&INDENT.repeat(depth));
    }

    fn close_line(&mut self, depth: usize) {
        self.out.push('\n');
        self.out.push_str(&INDENT.repeat(depth));
    }

    fn paint(&mut self, text: &str, tone: Tone) {
        if self.color {
            self.out.push_str("\u{1b}[");
            self.out.push_str(tone.code());
            self.out.push('m');
            self.out.push_str(text);
            self.out.push_str("\u{1b}[0m");
        } else {
            self.out.push_str(text);
        }
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}
