// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use textflow_engine::{RichTextBuffer, RichTextStyle};

#[allow(dead_code)]
pub fn generate_plain_text(paragraphs: usize) -> String {
    let base = "A paragraph of body text that wraps across several lines once laid out.\n\tAn indented follow-up line.\n\n";
    base.repeat(paragraphs)
}

/// Buffer with every other word bold, giving many small runs.
#[allow(dead_code)]
pub fn generate_styled_buffer(paragraphs: usize) -> RichTextBuffer {
    let text = generate_plain_text(paragraphs);
    let mut buffer = RichTextBuffer::from_text(&text, RichTextStyle::default());
    let mut offset = 0;
    for (index, word) in text.split(' ').enumerate() {
        let len = word.chars().count();
        if index % 2 == 1 && len > 0 {
            let _ = buffer.apply_style(offset, len, |style| style.clone().bold());
        }
        offset += len + 1;
    }
    buffer
}

#[allow(dead_code)]
pub fn generate_table_buffer(tables: usize) -> RichTextBuffer {
    let mut buffer = RichTextBuffer::from_text(&generate_plain_text(tables), RichTextStyle::default());
    for _ in 0..tables {
        let end = buffer.len();
        let _ = buffer.insert_table(end, 4, 3);
    }
    buffer
}
