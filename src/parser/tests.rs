//! Tests for the script compiler

use super::*;
use crate::types::graph::{Action, Guard, ValueSpec};

const JD_SCRIPT: &str = r#"
# 京东客服脚本
Step welcome
  Speak "您好，" + $name + "，欢迎来到京东客服"
  Listen 5,20
  If $amount > 100 Then vipProc
  Branch "投诉", complainProc
  Branch 订单, orderProc
  Branch "意图识别失败", welcome

Step complainProc
  Speak "请描述您的问题"
  Listen 5, 50
  UPGRATE $complaint "$listen_content"
  UPGRATE $status "处理中"
  Middle

// middle step asks whether to continue
Step middleProc
  Speak 还有其他问题吗？
  Listen 5,20
  Branch "没有", exit

Step exit
  Speak "感谢您的来电，再见"
  Exit
"#;

#[test]
fn compile_full_script() {
    let graph = compile(JD_SCRIPT).unwrap();
    assert_eq!(graph.len(), 4);

    let welcome = graph.get("welcome").unwrap();
    assert_eq!(
        welcome.actions,
        vec![
            Action::Speak {
                template: "您好，${name}，欢迎来到京东客服".to_string()
            },
            Action::Listen {
                min_duration: 5,
                max_duration: 20
            },
        ]
    );
    assert_eq!(welcome.guards, vec![Guard::new("$amount > 100", "vipProc")]);
    assert_eq!(welcome.branch.get("投诉").unwrap(), "complainProc");
    assert_eq!(welcome.branch.get("订单").unwrap(), "orderProc");
    assert_eq!(welcome.branch.len(), 3);

    let complain = graph.get("complainProc").unwrap();
    assert_eq!(
        complain.actions[2],
        Action::Upgrade {
            field: "complaint".to_string(),
            value: ValueSpec::Reference("listen_content".to_string()),
        }
    );
    assert_eq!(
        complain.actions[3],
        Action::Upgrade {
            field: "status".to_string(),
            value: ValueSpec::Literal("处理中".to_string()),
        }
    );
    assert_eq!(
        complain.actions[4],
        Action::Jump {
            target: "middleProc".to_string()
        }
    );

    let middle = graph.get("middleProc").unwrap();
    assert_eq!(
        middle.actions[0],
        Action::Speak {
            template: "还有其他问题吗？".to_string()
        }
    );
}

#[test]
fn compile_skips_comments_and_unknown_lines() {
    let script = r#"
// header
# another comment
Title 京东客服
Step welcome
  Note this line is ignored
  Exit
"#;
    let graph = compile(script).unwrap();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.get("welcome").unwrap().actions, vec![Action::Exit]);
}

#[test]
fn compile_empty_source() {
    let graph = compile("").unwrap();
    assert!(graph.is_empty());
}

#[test]
fn step_redefinition_last_write_wins() {
    let script = r#"
Step welcome
  Speak "first"
Step welcome
  Speak "second"
"#;
    let graph = compile(script).unwrap();
    assert_eq!(graph.len(), 1);
    assert_eq!(
        graph.get("welcome").unwrap().actions,
        vec![Action::Speak {
            template: "second".to_string()
        }]
    );
}

#[test]
fn guards_keep_declared_order() {
    let script = r#"
Step welcome
  If $a == 1 Then first
  If ($b == 2) Then second
"#;
    let graph = compile(script).unwrap();
    let guards = &graph.get("welcome").unwrap().guards;
    assert_eq!(guards[0], Guard::new("$a == 1", "first"));
    assert_eq!(guards[1], Guard::new("($b == 2)", "second"));
}

#[test]
fn dangling_targets_compile() {
    let script = r#"
Step welcome
  Branch "投诉", nowhere
  If $x > 1 Then alsoNowhere
"#;
    assert!(compile(script).is_ok());
}

#[test]
fn directives_before_first_step_are_dropped() {
    let script = r#"
Speak "orphan"
Step welcome
  Exit
"#;
    let graph = compile(script).unwrap();
    assert_eq!(graph.get("welcome").unwrap().actions, vec![Action::Exit]);
}

#[test]
fn unbalanced_if_condition_is_a_syntax_error() {
    let script = r#"
Step welcome
  Speak "hi"
  If ($amount > 100 Then vipProc
"#;
    match compile(script) {
        Err(CompileError::Syntax { line, message, text }) => {
            assert_eq!(line, 4);
            assert!(message.contains("unbalanced"));
            assert!(text.starts_with("If"));
        }
        other => panic!("Expected syntax error, got: {other:?}"),
    }
}

#[test]
fn malformed_directives_are_syntax_errors() {
    let cases = [
        "Step",
        "Step two words",
        "Listen 5",
        "Listen five,20",
        "UPGRATE status \"x\"",
        "UPGRATE $status",
        "UPGRATE $status \"open\" trailing",
        "If $a > 1",
        "If $a > 1 Then",
        "Branch 投诉",
        "Branch \"投诉\" complainProc",
        "Speak \"unterminated",
        "Speak \"a\" $b",
        "Speak \"a\" +",
        "Exit now",
        "Middle later",
    ];
    for case in cases {
        let script = format!("Step welcome\n{case}\n");
        let result = compile(&script);
        assert!(
            matches!(result, Err(CompileError::Syntax { line: 2, .. })),
            "`{case}` should be a syntax error, got {result:?}"
        );
    }
}

#[test]
fn syntax_error_display_has_line_context() {
    let err = compile("Step welcome\nListen x,y").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("line 2"));
    assert!(text.contains("Listen x,y"));
}

#[test]
fn upgrade_value_forms() {
    let script = r#"
Step welcome
  UPGRATE $a "literal text"
  UPGRATE $b plain
  UPGRATE $c $other
  UPGRATE $d ""
"#;
    let graph = compile(script).unwrap();
    let values: Vec<ValueSpec> = graph
        .get("welcome")
        .unwrap()
        .actions
        .iter()
        .map(|a| match a {
            Action::Upgrade { value, .. } => value.clone(),
            _ => panic!("Expected upgrade"),
        })
        .collect();
    assert_eq!(
        values,
        vec![
            ValueSpec::Literal("literal text".to_string()),
            ValueSpec::Literal("plain".to_string()),
            ValueSpec::Reference("other".to_string()),
            ValueSpec::Literal(String::new()),
        ]
    );
}

#[test]
fn render_then_compile_is_identity() {
    let graph = compile(JD_SCRIPT).unwrap();
    let rendered = render(&graph);
    let recompiled = compile(&rendered).unwrap();
    assert_eq!(graph, recompiled);

    // A second pass renders byte-identical text
    assert_eq!(rendered, render(&recompiled));
}

#[test]
fn render_escapes_quotes_in_labels_and_text() {
    let script = r#"
Step welcome
  Speak "He said \"hi\"" + $name
  Branch "a, b", next
"#;
    let graph = compile(script).unwrap();
    assert_eq!(
        graph.get("welcome").unwrap().actions[0],
        Action::Speak {
            template: "He said \"hi\"${name}".to_string()
        }
    );
    assert_eq!(compile(&render(&graph)).unwrap(), graph);
}

#[test]
fn variables_inside_speak_literals_become_placeholders() {
    let script = r#"
Step welcome
  Speak "Hello $name, order $order_id" + "!"
  Speak 订单金额 $amount 元
  Speak "cost $ and ${ x}"
"#;
    let graph = compile(script).unwrap();
    let actions = &graph.get("welcome").unwrap().actions;
    assert_eq!(
        *actions,
        vec![
            Action::Speak {
                template: "Hello ${name}, order ${order_id}!".to_string()
            },
            Action::Speak {
                template: "订单金额 ${amount} 元".to_string()
            },
            Action::Speak {
                template: "cost $ and ${ x}".to_string()
            },
        ]
    );
    assert_eq!(compile(&render(&graph)).unwrap(), graph);
}

#[test]
fn numeric_step_names_work_as_branch_targets() {
    let script = r#"
Step welcome
  Listen 1,2
  Branch "a", 2
  Branch b, 2
  Branch 'c,d', 007

Step 2
  Exit

Step 007
  Exit
"#;
    let graph = compile(script).unwrap();
    let welcome = graph.get("welcome").unwrap();
    assert_eq!(welcome.branch.get("a").unwrap(), "2");
    assert_eq!(welcome.branch.get("b").unwrap(), "2");
    assert_eq!(welcome.branch.get("c,d").unwrap(), "007");

    // Rendering quotes every label, which must still compile
    assert_eq!(compile(&render(&graph)).unwrap(), graph);
}

#[test]
fn then_inside_a_guard_literal_is_not_the_keyword() {
    let script = r#"
Step welcome
  If $s == "a Then b" Then next
  If $t == 'say \'Then\' ' Then other
"#;
    let graph = compile(script).unwrap();
    assert_eq!(
        graph.get("welcome").unwrap().guards,
        vec![
            Guard::new(r#"$s == "a Then b""#, "next"),
            Guard::new(r"$t == 'say \'Then\' '", "other"),
        ]
    );
}
