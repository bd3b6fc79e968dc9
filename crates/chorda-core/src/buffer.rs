/// One committed entry in the edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Token(String),
    Phoneme(String),
    Literal(String),
}

impl Unit {
    pub fn text(&self) -> &str {
        match self {
            Unit::Token(s) | Unit::Phoneme(s) | Unit::Literal(s) => s,
        }
    }

    /// Length in characters, not bytes. Phonemic fragments are multibyte.
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }
}

/// Host-side effect of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// Erase this many characters before the caret.
    Chars(usize),
    /// Nothing buffered; ask the host to delete the previous word instead.
    PrevWord,
}

/// Ordered sequence of committed units plus an in-progress literal run.
///
/// The buffer mirrors what has been typed into the host application since
/// the last flush: units joined by single spaces, with the literal run (text
/// mode) growing at the end. Deletion results report exactly the characters
/// the host must erase to stay in step.
#[derive(Debug, Default)]
pub struct EditBuffer {
    units: Vec<Unit>,
    run: String,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn pop_last(&mut self) -> Option<Unit> {
        self.units.pop()
    }

    /// Extends the in-progress literal run.
    pub fn push_literal(&mut self, chars: &str) {
        self.run.push_str(chars);
    }

    /// Commits a non-empty literal run to the unit sequence.
    pub fn fold_run(&mut self) {
        if !self.run.is_empty() {
            let run = std::mem::take(&mut self.run);
            self.units.push(Unit::Literal(run));
        }
    }

    /// Removes the latest input: the last run character if a run is in
    /// progress, the last unit otherwise. The returned count matches what
    /// was typed for it, including the separator where one was.
    pub fn delete_last(&mut self) -> Deletion {
        if !self.run.is_empty() {
            self.run.pop();
            let mut erase = 1;
            if self.run.is_empty() && !self.units.is_empty() {
                erase += 1; // the separator typed when the run began
            }
            return Deletion::Chars(erase);
        }
        match self.units.pop() {
            Some(unit) => {
                let mut erase = unit.char_len();
                if !self.units.is_empty() {
                    erase += 1; // separator before the erased unit
                }
                Deletion::Chars(erase)
            }
            None => Deletion::PrevWord,
        }
    }

    /// Drains the buffer: folds any literal run, joins every unit with
    /// single spaces, and returns the text with its character count. Safe
    /// no-op on an empty buffer.
    pub fn flush(&mut self) -> (String, usize) {
        self.fold_run();
        if self.units.is_empty() {
            return (String::new(), 0);
        }
        let joined = self
            .units
            .iter()
            .map(Unit::text)
            .collect::<Vec<_>>()
            .join(" ");
        let count = joined.chars().count();
        self.units.clear();
        (joined, count)
    }

    /// Non-destructive rendering, with a cursor marker while a literal run
    /// is open.
    pub fn display(&self) -> String {
        let mut out = self
            .units
            .iter()
            .map(Unit::text)
            .collect::<Vec<_>>()
            .join(" ");
        if !self.run.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&self.run);
            out.push('▌');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.run.is_empty()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn run_in_progress(&self) -> bool {
        !self.run.is_empty()
    }

    pub fn clear(&mut self) {
        self.units.clear();
        self.run.clear();
    }
}
