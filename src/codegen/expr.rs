use super::CodeGenerator;
use crate::tir::{TirExpr, TirExprKind};

impl<'a> CodeGenerator<'a> {
    /// C++ text of an expression. Calls may queue prelude lines.
    pub(super) fn cpp_expr(&mut self, expr: &TirExpr) -> String {
        match &expr.kind {
            TirExprKind::StrLiteral(s) | TirExprKind::ClassName(s) => cpp_string(s),
            TirExprKind::IntLiteral(i) => i.to_string(),
            TirExprKind::Null => "null".to_string(),
            TirExprKind::Var(name) => self.variable(name),
            TirExprKind::This => "this".to_string(),
            TirExprKind::Concat(left, right) => {
                let left = self.cpp_expr(left);
                let right = self.cpp_expr(right);
                format!("concat({}, {})", left, right)
            }
            TirExprKind::Assign { target, value } => {
                let value = self.cpp_expr(value);
                format!("({} = {})", self.variable(target), value)
            }
            TirExprKind::DynamicCall(site) => self.cpp_dynamic_call(site),
            TirExprKind::StaticCall(call) => self.cpp_static_call(call),
        }
    }
}

/// Double-quoted C++ string literal.
pub(super) fn cpp_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body, compile};
    use super::*;
    use crate::test_support::*;
    use serde_json::json;

    #[test]
    fn escapes_string_literals() {
        assert_eq!(cpp_string("plain"), "\"plain\"");
        assert_eq!(cpp_string("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
        assert_eq!(cpp_string("\u{1}"), "\"\\001\"");
    }

    #[test]
    fn renders_assignments_and_concatenation() {
        let out = compile(json!({"units": [{"path": "a.php", "functions": [
            {"name": "f", "body": body(vec![
                assign("name", concat(s("get_"), var("kind"))),
                json!({"kind": "int", "value": 42}),
            ])},
        ]}]}));
        assert!(out.text.contains("  (v_name = concat(\"get_\", v_kind));\n"));
        assert!(out.text.contains("  42;\n"));
    }
}
