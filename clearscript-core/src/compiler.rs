use crate::codegen::generate;
use crate::emit::emit;
use crate::error::CoreError;
use crate::lexer::tokenize;
use crate::listing::Listing;
use crate::name_resolve::resolve;
use crate::parser::parse;

/// Result of a successful compilation: the verified listing and its text.
#[derive(Debug, PartialEq)]
pub struct CompilationArtifact {
    pub listing: Listing,
    pub text: String,
}

/// Compile ClearScript source text into StateScript listing text.
///
/// Nothing is returned unless every stage succeeds.
pub fn compile(source: &str) -> Result<String, CoreError> {
    compile_artifact(source).map(|artifact| artifact.text)
}

/// Like [`compile`], but also hands back the structured listing.
pub fn compile_artifact(source: &str) -> Result<CompilationArtifact, CoreError> {
    let tokens = tokenize(source)?;
    log::debug!("lexed {} tokens", tokens.len());

    let program = parse(tokens)?;
    log::debug!("parsed {} top-level statements", program.items.len());

    let resolved = resolve(program)?;
    log::debug!("resolved {} symbols", resolved.symbols.len());

    let listing = generate(&resolved)?;
    log::debug!(
        "generated {} items with {} labels",
        listing.items().len(),
        listing.label_count()
    );

    let text = emit(&listing);
    Ok(CompilationArtifact { listing, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    #[test]
    fn compiles_minimal_program() {
        assert_eq!(compile("kill();").expect("compile"), "GOTO _main\n:_main\nKILL\n");
    }

    #[test]
    fn artifact_exposes_label_index() {
        let artifact = compile_artifact("function f() { } f();").expect("compile");
        assert_eq!(artifact.listing.label_position("f"), Some(1));
        assert_eq!(artifact.listing.label_position("_main"), Some(3));
        assert!(artifact.text.starts_with("GOTO _main\n:f\nRETURN\n:_main\n"));
    }

    #[test]
    fn each_stage_reports_its_own_error_kind() {
        assert!(matches!(compile("int x = @;"), Err(CoreError::LexError { .. })));
        assert!(matches!(compile("int x = ;"), Err(CoreError::ParseError { .. })));
        assert!(matches!(compile("y = 1;"), Err(CoreError::SemanticError(_))));
    }

    #[test]
    fn diagnostics_carry_line_and_column() {
        let err = compile("int a;\nint b = a;\nb = c + d;").expect_err("undeclared");
        let diagnostics = err.diagnostics();
        let positions: Vec<_> = diagnostics.iter().map(|d| (d.line(), d.column())).collect();
        assert_eq!(positions, vec![(3, 5), (3, 9)]);
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Error));
    }
}
