use std::collections::HashSet;
use std::thread;

use clearscript_core::{CoreError, compile};

const NESTED: &str = r#"
int total = 0;
int[] weights = [4, 8, 15];

function score(limit) {
    for (int i = 0; i < limit; i++) {
        int j = 0;
        while (j < 3) {
            total = total + (j > 1 ? weights[j] : i);
            if (total > 100) {
                break;
            } else if (total > 50) {
                total = total > 75 ? total - 1 : total;
            }
            j++;
        }
    }
    return total;
}

int best = score(3) > 10 ? score(1) : 0;
switch (best) {
    case 1: wait(1);
    case 2: wait(best > 1 ? 2 : 3); break;
    default: kill();
}
"#;

fn lines(listing: &str) -> Vec<&str> {
    listing.lines().collect()
}

/// Replaces every digit run that follows `_` with `N`, erasing counter values.
fn normalize(listing: &str) -> String {
    let mut out = String::with_capacity(listing.len());
    let mut after_underscore = false;
    for ch in listing.chars() {
        if ch.is_ascii_digit() && after_underscore {
            if !out.ends_with('N') {
                out.push('N');
            }
            continue;
        }
        after_underscore = ch == '_';
        out.push(ch);
    }
    out
}

#[test]
fn scenario_increment_function_matches_expected_listing() {
    let source = "int x = 10;\nfunction test() { x++; }\ntest();\nkill();\n";
    assert_eq!(
        compile(source).expect("compile"),
        "INIT x 10\nGOTO _main\n:test\nINC x\nRETURN\n:_main\nCALL test\nKILL\n"
    );
}

#[test]
fn scenario_literal_array_index_is_a_direct_slot() {
    let listing = compile("int[] arr = [1,2,3]; int v = arr[1];").expect("compile");
    assert_eq!(
        listing,
        "INIT arr_0 1\nINIT arr_1 2\nINIT arr_2 3\nINIT arr_length 3\nINIT v 0\n\
         GOTO _main\n:_main\nSET v arr_1\n"
    );
    assert!(!listing.contains('$'), "no runtime indexing expected");
}

#[test]
fn scenario_switch_concatenates_case_bodies_without_breaks() {
    let source = "int x;\nfunction a() { }\nfunction b() { }\nfunction c() { }\n\
                  switch(x){ case 1: a(); case 2: b(); default: c(); }";
    let listing = compile(source).expect("compile");
    let main: Vec<_> = lines(&listing)
        .into_iter()
        .skip_while(|line| *line != ":_main")
        .skip(1)
        .collect();
    assert_eq!(
        main,
        vec![
            "GOTO _switch_case_1 {x == 1}",
            "GOTO _switch_case_2 {x == 2}",
            "GOTO _switch_default_3",
            ":_switch_case_1",
            "CALL a",
            ":_switch_case_2",
            "CALL b",
            ":_switch_default_3",
            "CALL c",
            ":_switch_end_4",
        ]
    );
}

#[test]
fn compilation_is_deterministic() {
    let first = compile(NESTED).expect("compile");
    let second = compile(NESTED).expect("compile");
    assert_eq!(first, second);
}

#[test]
fn concurrent_compilations_do_not_interfere() {
    let expected = compile(NESTED).expect("compile");
    let outputs: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| compile(NESTED).expect("compile")))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });
    assert!(outputs.iter().all(|output| *output == expected));
}

#[test]
fn generated_labels_are_unique() {
    let listing = compile(NESTED).expect("compile");
    let labels: Vec<_> = lines(&listing)
        .into_iter()
        .filter(|line| line.starts_with(':'))
        .collect();
    let unique: HashSet<_> = labels.iter().collect();
    assert_eq!(labels.len(), unique.len(), "duplicate label in:\n{listing}");
    assert_eq!(labels.iter().filter(|l| **l == ":_main").count(), 1);
    assert!(labels.len() > 10);
}

#[test]
fn for_loop_is_equivalent_to_hand_written_while() {
    let for_version = compile(
        "int s;\nfunction f() { for (int i = 0; i < 3; i++) { s = s + i; } }",
    )
    .expect("compile for");
    let while_version = compile(
        "int s;\nfunction f() { int i = 0; while (i < 3) { s = s + i; i++; } }",
    )
    .expect("compile while");
    assert_eq!(normalize(&for_version), normalize(&while_version));

    // Same shape when the loop sits after other synthetic labels.
    let shifted_for = compile(
        "int s;\nfunction f() { if (s) { } for (; s < 3;) { s++; } }",
    )
    .expect("compile shifted for");
    let shifted_while = compile(
        "int s;\nfunction f() { if (s) { } while (s < 3) { s++; } }",
    )
    .expect("compile shifted while");
    assert_eq!(normalize(&shifted_for), normalize(&shifted_while));

    // At the top level the loop variable is initialised like any global.
    for init in ["0", "s + 1"] {
        let top_for = compile(&format!(
            "int s;\nfor (int i = {init}; i < 3; i++) {{ s = s + i; }}"
        ))
        .expect("compile top-level for");
        let top_while = compile(&format!(
            "int s;\nint i = {init};\nwhile (i < 3) {{ s = s + i; i++; }}"
        ))
        .expect("compile top-level while");
        assert_eq!(top_for, top_while);
    }
}

#[test]
fn raw_block_text_passes_through_unchanged() {
    let inner = "\n    GOTO somewhere {x == 1}\n    int y = \"not a string; while ( {\n    }\n    :odd-label 1.2.3 @#%\n";
    let source = format!("int x;\nraw {{{inner}}}\nkill();\n");
    let listing = compile(&source).expect("compile");
    assert!(listing.contains(inner), "raw text altered:\n{listing}");
    assert!(listing.ends_with("KILL\n"));
}

#[test]
fn use_before_declaration_is_rejected_without_output() {
    let err = compile("function f() { y = 1; int y = 2; }").expect_err("must fail");
    let CoreError::SemanticError(diagnostics) = err else {
        panic!("expected semantic error, got {err:?}");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!((diagnostics[0].line(), diagnostics[0].column()), (1, 16));
}

#[test]
fn redeclaration_in_the_same_scope_is_rejected() {
    let err = compile("function f() { int y; float y; }").expect_err("must fail");
    assert!(matches!(err, CoreError::SemanticError(ref d) if d.len() == 1));

    // The same name in a nested block is a new binding.
    assert!(compile("function f() { int y; if (y) { float y = 1.5; } }").is_ok());
}

#[test]
fn semantic_errors_are_reported_together() {
    let err = compile("a = 1;\nb = 2;\ngoto nowhere;\nmoveto(1);\n").expect_err("must fail");
    let lines: Vec<_> = err.diagnostics().iter().map(|d| d.line()).collect();
    assert_eq!(lines, vec![1, 2, 3, 4]);
}
