/// Three-state result of a static signal: a latched hit carries the
/// file it was found in, a finished scan without a hit is `Absent`, and
/// a kit whose extraction failed stays `Unknown`. The distinction
/// matters downstream: `Unknown` is not evidence of absence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Detection {
    #[default]
    Unknown,
    Absent,
    PresentIn(String),
}

impl Detection {
    pub fn is_present(&self) -> bool {
        matches!(self, Detection::PresentIn(_))
    }

    /// Monotonic: once present, later latches are ignored.
    pub fn latch(&mut self, file: &str) {
        if !self.is_present() {
            *self = Detection::PresentIn(file.to_string());
        }
    }

    /// Scanning finished without a hit; an existing hit is kept.
    pub fn settle(&mut self) {
        if *self == Detection::Unknown {
            *self = Detection::Absent;
        }
    }

    pub fn to_field(&self) -> String {
        match self {
            Detection::Unknown => String::new(),
            Detection::Absent => "false".to_string(),
            Detection::PresentIn(file) => file.clone(),
        }
    }

    pub fn from_field(field: &str) -> Self {
        match field {
            "" => Detection::Unknown,
            "false" | "False" => Detection::Absent,
            file => Detection::PresentIn(file.to_string()),
        }
    }
}

/// The exfiltration markers scanned for in kit source files.
const MAIL_MARKER: &str = "mail(";
const FILE_WRITE_MARKER: &str = "fwrite(";
const BOT_API_MARKER: &str = "api.telegram";
const RECURSE_COPY_MARKER: &str = "recurse_copy";

/// Per-kit latch state for the four content signals, with an "all
/// found" short-circuit so fully characterized kits stop being read.
#[derive(Debug, Default)]
pub struct BehaviorProfile {
    pub mail: Detection,
    pub file_write: Detection,
    pub bot_api: Detection,
    pub recurse_copy: Detection,
}

impl BehaviorProfile {
    /// Tests one source line against every unlatched signal.
    pub fn scan_line(&mut self, line: &str, file: &str) {
        if !self.mail.is_present() && line.contains(MAIL_MARKER) {
            self.mail.latch(file);
        }
        if !self.file_write.is_present() && line.contains(FILE_WRITE_MARKER) {
            self.file_write.latch(file);
        }
        if !self.bot_api.is_present() && line.contains(BOT_API_MARKER) {
            self.bot_api.latch(file);
        }
        if !self.recurse_copy.is_present() && line.contains(RECURSE_COPY_MARKER) {
            self.recurse_copy.latch(file);
        }
    }

    pub fn all_found(&self) -> bool {
        self.mail.is_present()
            && self.file_write.is_present()
            && self.bot_api.is_present()
            && self.recurse_copy.is_present()
    }

    /// Marks every unlatched signal as scanned-and-absent.
    pub fn settle(&mut self) {
        self.mail.settle();
        self.file_write.settle();
        self.bot_api.settle();
        self.recurse_copy.settle();
    }
}

/// Does a file name look like a harvested-credentials drop
/// (`result.txt`, `Results.html`, ...)? Only the two casings the kits
/// themselves use are checked.
pub fn is_result_artifact(file_name: &str) -> bool {
    file_name.contains("result") || file_name.contains("Result")
}
