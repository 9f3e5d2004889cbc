//! Error taxonomy and the build-error log.
//!
//! Every pass reports failures through one central [`ErrorLog`]. Reporting an
//! enabled error kind records a [`Diag`] and returns [`BuildInterrupt`],
//! which the pass propagates with `?` all the way to the driver; passes make
//! no attempt at local recovery. Individual kinds can be disabled, in which
//! case a report is silently dropped and the pass continues — tests use this
//! to reach code behind an early check.

use std::fmt;

use veld_base::Span;

/// The closed set of build-error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ErrorKind {
    UnknownName,
    Redefinition,
    WriteToImmutable,
    NoImplicitConversion,
    InvalidArguments,
    NoSuchMember,
    NotInFunBodyContext,
    UnreachableCode,
    CtConstRequired,
    RetTypeCantHaveMutQualifier,
    SameArgWasDefinedMultipleTimes,
    ObjectExpected,
    OnlyLocalStorageDurationApplicable,
    NonIgnoreAccessToLocalDataObjectBeforeItsInitialization,
    ComputedValueNotUsed,
    MultipleInitializers,
    Syntax,
}

impl ErrorKind {
    pub const COUNT: usize = 17;

    /// The stable code printed in diagnostics and matched by tests.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnknownName => "eUnknownName",
            ErrorKind::Redefinition => "eRedefinition",
            ErrorKind::WriteToImmutable => "eWriteToImmutable",
            ErrorKind::NoImplicitConversion => "eNoImplicitConversion",
            ErrorKind::InvalidArguments => "eInvalidArguments",
            ErrorKind::NoSuchMember => "eNoSuchMember",
            ErrorKind::NotInFunBodyContext => "eNotInFunBodyContext",
            ErrorKind::UnreachableCode => "eUnreachableCode",
            ErrorKind::CtConstRequired => "eCTConstRequired",
            ErrorKind::RetTypeCantHaveMutQualifier => "eRetTypeCantHaveMutQualifier",
            ErrorKind::SameArgWasDefinedMultipleTimes => "eSameArgWasDefinedMultipleTimes",
            ErrorKind::ObjectExpected => "eObjectExpected",
            ErrorKind::OnlyLocalStorageDurationApplicable => {
                "eOnlyLocalStorageDurationApplicable"
            }
            ErrorKind::NonIgnoreAccessToLocalDataObjectBeforeItsInitialization => {
                "eNonIgnoreAccessToLocalDataObjectBeforeItsInitialization"
            }
            ErrorKind::ComputedValueNotUsed => "eComputedValueNotUsed",
            ErrorKind::MultipleInitializers => "eMultipleInitializers",
            ErrorKind::Syntax => "eSyntax",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One recorded build error.
#[derive(Debug, Clone)]
pub struct Diag {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {}..{}", span.start, span.end)?;
        }
        Ok(())
    }
}

/// Signal that a pass was abandoned after reporting an error.
///
/// The replacement for exception-style unwinding: the error itself lives in
/// the [`ErrorLog`]; this marker only carries the fact that compilation must
/// stop. Internal errors (broken invariants, failed IR verification) are a
/// separate condition, see [`BuildInterrupt::Internal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildInterrupt {
    /// One or more build errors were recorded; see the log.
    Errors,
    /// An internal invariant broke; the message is for the maintainer.
    Internal(String),
}

impl fmt::Display for BuildInterrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildInterrupt::Errors => write!(f, "compilation stopped after build errors"),
            BuildInterrupt::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for BuildInterrupt {}

/// Result alias used by every pass entry point.
pub type PassResult<T> = Result<T, BuildInterrupt>;

/// Central collector for build errors.
pub struct ErrorLog {
    diags: Vec<Diag>,
    disabled: [bool; ErrorKind::COUNT],
}

impl ErrorLog {
    pub fn new() -> Self {
        ErrorLog {
            diags: Vec::new(),
            disabled: [false; ErrorKind::COUNT],
        }
    }

    /// Masks `kind`: subsequent reports of it are dropped without recording
    /// and without interrupting the pass.
    pub fn disable(&mut self, kind: ErrorKind) {
        self.disabled[kind as usize] = true;
    }

    pub fn is_disabled(&self, kind: ErrorKind) -> bool {
        self.disabled[kind as usize]
    }

    /// Records an error and interrupts the pass, unless `kind` is masked.
    pub fn report(
        &mut self,
        kind: ErrorKind,
        span: Option<Span>,
        message: impl Into<String>,
    ) -> PassResult<()> {
        if self.is_disabled(kind) {
            return Ok(());
        }
        self.diags.push(Diag {
            kind,
            message: message.into(),
            span,
        });
        Err(BuildInterrupt::Errors)
    }

    pub fn diags(&self) -> &[Diag] {
        &self.diags
    }

    pub fn has_errors(&self) -> bool {
        !self.diags.is_empty()
    }

    /// Kind of the first recorded error, if any. Tests match on this.
    pub fn first_kind(&self) -> Option<ErrorKind> {
        self.diags.first().map(|d| d.kind)
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_records_and_interrupts() {
        let mut log = ErrorLog::new();
        let res = log.report(ErrorKind::UnknownName, None, "no binding for `x`");
        assert_eq!(res, Err(BuildInterrupt::Errors));
        assert!(log.has_errors());
        assert_eq!(log.first_kind(), Some(ErrorKind::UnknownName));
    }

    #[test]
    fn disabled_kind_is_silently_dropped() {
        let mut log = ErrorLog::new();
        log.disable(ErrorKind::ComputedValueNotUsed);
        let res = log.report(ErrorKind::ComputedValueNotUsed, None, "unused");
        assert_eq!(res, Ok(()));
        assert!(!log.has_errors());
    }

    #[test]
    fn other_kinds_stay_enabled_after_disable() {
        let mut log = ErrorLog::new();
        log.disable(ErrorKind::ComputedValueNotUsed);
        assert!(log
            .report(ErrorKind::Redefinition, None, "x defined twice")
            .is_err());
    }

    #[test]
    fn codes_match_the_published_taxonomy() {
        assert_eq!(ErrorKind::CtConstRequired.code(), "eCTConstRequired");
        assert_eq!(
            ErrorKind::NonIgnoreAccessToLocalDataObjectBeforeItsInitialization.code(),
            "eNonIgnoreAccessToLocalDataObjectBeforeItsInitialization"
        );
    }
}
