#[cfg(test)]
mod parser_tests {
    use kvexpr as kx;

    use kx::environment::MapProvider;
    use kx::expr::{ExprKind, Expression};
    use kx::function::Callable;
    use kx::interpreter::Interpreter;
    use kx::node::ParseNodeKind;
    use kx::parser::{parse_space_separated, parse_template, ParseResult};

    fn parse(source: &str) -> ParseResult {
        Interpreter::new().parse(source)
    }

    /// Parse and insist the whole input was consumed without errors.
    fn parse_all(source: &str) -> Expression {
        let parsed = parse(source);
        assert!(
            parsed.errors.is_empty(),
            "unexpected errors for {:?}: {:?}",
            source,
            parsed.errors
        );
        assert_eq!(parsed.next_index, source.len(), "input left over in {:?}", source);
        parsed.expression.expect("no expression")
    }

    fn call_parts(expr: &Expression) -> (&Expression, &[Expression]) {
        match &expr.kind {
            ExprKind::Call { callee, args } => (callee, args),
            other => panic!("expected a call, got {:?}", other),
        }
    }

    fn callee_name(expr: &Expression) -> String {
        let (callee, _) = call_parts(expr);
        match &callee.kind {
            ExprKind::Literal(kx::Value::Function(f)) => f.name().to_string(),
            other => panic!("callee is not a resolved function: {:?}", other),
        }
    }

    #[test]
    fn test_parser_01_infix_call_spans() {
        let expr = parse_all("1+2");
        assert_eq!((expr.span.pos, expr.span.len), (0, 3));

        let (callee, args) = call_parts(&expr);
        assert_eq!((callee.span.pos, callee.span.len), (1, 1));
        assert_eq!(args.len(), 2);
        assert_eq!((args[0].span.pos, args[0].span.len), (0, 1));
        assert_eq!((args[1].span.pos, args[1].span.len), (2, 1));
    }

    #[test]
    fn test_parser_02_parse_tree_for_infix() {
        let parsed = parse("1 + 2");
        assert_eq!(parsed.node.kind, ParseNodeKind::RootExpression);
        assert_eq!((parsed.node.pos, parsed.node.len), (0, 5));

        let infix = &parsed.node.children[0];
        assert_eq!(infix.kind, ParseNodeKind::InfixExpression);
        let kinds: Vec<ParseNodeKind> = infix
            .children
            .iter()
            .filter(|n| n.kind != ParseNodeKind::WhiteSpace)
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ParseNodeKind::LiteralInteger,
                ParseNodeKind::Operator,
                ParseNodeKind::LiteralInteger
            ]
        );
    }

    #[test]
    fn test_parser_03_precedence() {
        let expr = parse_all("1 + 2 * 3");
        assert_eq!(callee_name(&expr), "+");
        let (_, args) = call_parts(&expr);
        assert_eq!(callee_name(&args[1]), "*");
    }

    #[test]
    fn test_parser_04_same_symbol_runs_are_one_call() {
        let expr = parse_all("1 + 2 + 3");
        assert_eq!(callee_name(&expr), "+");
        assert_eq!(call_parts(&expr).1.len(), 3);

        let expr = parse_all("1 + 2 - 3");
        assert_eq!(callee_name(&expr), "-");
        let (_, args) = call_parts(&expr);
        assert_eq!(args.len(), 2);
        assert_eq!(callee_name(&args[0]), "+");
    }

    #[test]
    fn test_parser_05_pair_joins_two_operands_only() {
        let expr = parse_all("1 | 2");
        assert!(matches!(&expr.kind, ExprKind::List(items) if items.len() == 2));

        let parsed = parse("1 | 2 | 3");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].message, "'|' joins exactly two operands");
    }

    #[test]
    fn test_parser_06_operators_resolve_against_the_provider() {
        let interpreter = Interpreter::with_root(MapProvider::new().into_ref());
        let parsed = interpreter.parse("1 + 2");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].message, "function '+' is not defined");
        assert_eq!(parsed.errors[0].position, 2);
    }

    #[test]
    fn test_parser_07_general_infix_with_tilde() {
        let expr = parse_all("[1, 2, 3] reduce (acc, x) => acc + x ~ 10");
        assert_eq!(callee_name(&expr), "reduce");
        let (callee, args) = call_parts(&expr);
        assert_eq!((callee.span.pos, callee.span.len), (10, 6));
        assert_eq!(args.len(), 3);
        assert!(matches!(args[1].kind, ExprKind::Lambda(_)));
    }

    #[test]
    fn test_parser_08_lambda_parameters() {
        let expr = parse_all("(A, b) => a + b");
        match &expr.kind {
            ExprKind::Lambda(def) => assert_eq!(def.params, vec!["a", "b"]),
            other => panic!("expected a lambda, got {:?}", other),
        }

        let expr = parse_all("x => x");
        assert!(matches!(expr.kind, ExprKind::Lambda(_)));

        let parsed = parse("(a, A) => a");
        assert_eq!(parsed.errors[0].message, "parameter 'A' is duplicated");
    }

    #[test]
    fn test_parser_09_keyword_forms_call_library_functions() {
        let expr = parse_all("if 1 < 2 then 'a' else 'b'");
        assert_eq!(callee_name(&expr), "if");
        let (callee, args) = call_parts(&expr);
        assert_eq!((callee.span.pos, callee.span.len), (0, 2));
        assert_eq!(args.len(), 3);

        let expr = parse_all("case 1 = 2: 'x', 2 = 2: 'y', 'z'");
        assert_eq!(callee_name(&expr), "case");
        assert_eq!(call_parts(&expr).1.len(), 5);

        let expr = parse_all("switch 3, 1: 'a', 3: 'c', 'z'");
        assert_eq!(callee_name(&expr), "switch");
        assert_eq!(call_parts(&expr).1.len(), 6);
    }

    #[test]
    fn test_parser_10_case_without_condition() {
        let parsed = parse("case");
        assert!(parsed.expression.is_none());
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].message, "case condition expected");
        assert_eq!(parsed.errors[0].position, 4);
    }

    #[test]
    fn test_parser_11_format_string() {
        let source = "f\"x{1+2}y\"";
        let expr = parse_all(source);
        assert_eq!(callee_name(&expr), "concat");
        assert_eq!((expr.span.pos, expr.span.len), (0, source.len()));
        assert_eq!(call_parts(&expr).1.len(), 3);

        let parsed = parse(source);
        assert_eq!(parsed.node.children[0].kind, ParseNodeKind::StringTemplate);
    }

    #[test]
    fn test_parser_12_member_access_and_calls() {
        let expr = parse_all("{x: {y: 1}}.x . y");
        assert_eq!(callee_name(&expr), ".");

        let expr = parse_all("a?.b");
        assert_eq!(callee_name(&expr), "?.");

        let expr = parse_all("f(1, 2,)");
        let (callee, args) = call_parts(&expr);
        assert!(matches!(&callee.kind, ExprKind::Reference { lookup, .. } if lookup == "f"));
        assert_eq!(args.len(), 2);

        let expr = parse_all("xs[0]");
        assert_eq!(call_parts(&expr).1.len(), 1);
    }

    #[test]
    fn test_parser_13_selector() {
        let expr = parse_all("{a: 4}{a: a}");
        assert!(matches!(expr.kind, ExprKind::Selector { .. }));

        let parsed = parse("{a: 4}{a: a}");
        assert_eq!(parsed.node.children[0].kind, ParseNodeKind::Selector);
    }

    #[test]
    fn test_parser_14_naked_root_kvc() {
        let expr = parse_all("a: 1; b: a + 1; return b");
        match &expr.kind {
            ExprKind::Kvc(def) => {
                assert_eq!(def.fields.len(), 2);
                assert!(def.ret.is_some());
            }
            other => panic!("expected a kvc, got {:?}", other),
        }

        let expr = parse_all("  'my key': 1");
        assert!(matches!(expr.kind, ExprKind::Kvc(_)));
    }

    #[test]
    fn test_parser_15_trailing_operator_is_left_unconsumed() {
        let parsed = parse("1 +");
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.next_index, 2);
        assert!(!parsed.is_complete("1 +"));
    }

    #[test]
    fn test_parser_16_comments_are_blanks() {
        let source = "// leading\n 1 + /* inner */ 2 // trailing";
        let parsed = parse(source);
        assert!(parsed.is_complete(source));
        let comments = parsed
            .node
            .iter()
            .filter(|n| n.kind == ParseNodeKind::Comment)
            .count();
        assert_eq!(comments, 3);
    }

    #[test]
    fn test_parser_17_template_document() {
        let provider = kx::library::root();
        let source = "Hello ${'wor' + 'ld'}! \\${x}";
        let parsed = parse_template(source, &provider);
        assert!(parsed.is_complete(source), "{:?}", parsed.errors);

        let parsed = parse_template("plain text", &provider);
        let expr = parsed.expression.expect("no expression");
        assert!(matches!(&expr.kind, ExprKind::Literal(kx::Value::String(s)) if s == "plain text"));
        assert_eq!((expr.span.pos, expr.span.len), (0, 10));

        let parsed = parse_template("${1 +", &provider);
        assert!(!parsed.errors.is_empty());
    }

    #[test]
    fn test_parser_18_space_separated() {
        let provider = kx::library::root();
        let source = " 1 'two' [3] {four: 4} ";
        let parsed = parse_space_separated(source, &provider);
        assert!(parsed.is_complete(source), "{:?}", parsed.errors);
        match parsed.expression.map(|e| e.kind) {
            Some(ExprKind::List(items)) => assert_eq!(items.len(), 4),
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_19_keywords_are_case_insensitive() {
        let expr = parse_all("IF TRUE THEN 1 ELSE 2");
        assert_eq!(callee_name(&expr), "if");

        let expr = parse_all("Null");
        assert!(matches!(expr.kind, ExprKind::Null));
    }

    #[test]
    fn test_parser_20_empty_input() {
        let parsed = parse("   ");
        assert!(parsed.expression.is_none());
        assert_eq!(parsed.errors[0].message, "expression expected");
        assert_eq!(parsed.errors[0].position, 3);
    }
}
