use std::fmt::{
	Arguments as FmtArguments,
	Display,
	Write as FmtWrite,
};

// ------------------------------------------------------------------------------------------------
// CodeWriter
// ------------------------------------------------------------------------------------------------

/// Accumulates generated C text, indenting each new line to the current nesting level.
///
/// Because of `write_fmt`, you can use `write!`/`writeln!` on it directly. Writing into a string
/// can't fail, so those return `()`.
#[derive(Debug, Clone)]
pub struct CodeWriter {
	buf:           String,
	indent:        usize,
	at_line_start: bool,
}

impl Default for CodeWriter {
	fn default() -> Self {
		Self::new()
	}
}

impl CodeWriter {
	pub fn new() -> Self {
		Self { buf: String::new(), indent: 0, at_line_start: true }
	}

	/// Text written so far.
	pub fn as_str(&self) -> &str {
		&self.buf
	}

	pub fn into_string(self) -> String {
		self.buf
	}

	/// Increases the nesting level of the following lines.
	pub fn indent(&mut self) {
		self.indent += 1;
	}

	/// Decreases it.
	pub fn dedent(&mut self) {
		self.indent = self.indent.saturating_sub(1);
	}

	/// Writes `name:` on its own line, at column 0.
	pub fn label(&mut self, name: impl Display) {
		self.end_line();
		let _ = writeln!(self.buf, "{}:", name);
		self.at_line_start = true;
	}

	/// Writes an empty line.
	pub fn blank(&mut self) {
		self.end_line();
		self.buf.push('\n');
	}

	/// Writes `text` verbatim, without indenting it.
	pub fn raw(&mut self, text: &str) {
		self.buf.push_str(text);
		self.at_line_start = text.ends_with('\n');
	}

	/// Writes `head {`, then whatever `body` writes one level deeper, then `}`.
	pub fn block(&mut self, head: impl Display, body: impl FnOnce(&mut Self)) {
		writeln!(self, "{} {{", head);
		self.indent();
		body(self);
		self.dedent();
		writeln!(self, "}}");
	}

	/// Makes `write!` and `writeln!` work on a `CodeWriter`.
	pub fn write_fmt(&mut self, args: FmtArguments<'_>) {
		let text = args.to_string();

		for piece in text.split_inclusive('\n') {
			if self.at_line_start && piece != "\n" {
				for _ in 0 .. self.indent {
					self.buf.push('\t');
				}
			}

			self.buf.push_str(piece);
			self.at_line_start = piece.ends_with('\n');
		}
	}

	fn end_line(&mut self) {
		if !self.at_line_start {
			self.buf.push('\n');
			self.at_line_start = true;
		}
	}
}
