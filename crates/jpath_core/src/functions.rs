//! Standard function extensions (RFC 9535 section 2.4.4 - 2.4.8)

use crate::registry::FunctionExtension;
use crate::types::{PathType, PathValue, check_args};
use regex::Regex;
use regex_syntax::ast::{
    self, AssertionKind, Ast, ClassBracketed, ClassSet, ClassSetItem, ClassSetUnion,
    ClassUnicodeKind, GroupKind, LiteralKind, Span, SpecialLiteralKind,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::thread::LocalKey;

type RegexCache = RefCell<HashMap<String, Option<Regex>>>;

/// Entries kept per cache before it is cleared
const REGEX_CACHE_LIMIT: usize = 256;

// Compiled patterns keyed by the source pattern, one table per anchoring.
// Invalid patterns are cached as None so they are not re-parsed per node.
thread_local! {
    static MATCH_CACHE: RegexCache = RefCell::new(HashMap::new());
    static SEARCH_CACHE: RegexCache = RefCell::new(HashMap::new());
}

/// `length`, `count`, `value`, `match` and `search`
pub fn standard_functions() -> Vec<FunctionExtension> {
    vec![
        FunctionExtension::new(
            "length",
            PathType::Value,
            |args| check_args(args, &[PathType::Value]),
            length,
        ),
        FunctionExtension::new(
            "count",
            PathType::Value,
            |args| check_args(args, &[PathType::Nodes]),
            count,
        ),
        FunctionExtension::new(
            "value",
            PathType::Value,
            |args| check_args(args, &[PathType::Nodes]),
            value,
        ),
        FunctionExtension::new(
            "match",
            PathType::Logical,
            |args| check_args(args, &[PathType::Value, PathType::Value]),
            full_match,
        ),
        FunctionExtension::new(
            "search",
            PathType::Logical,
            |args| check_args(args, &[PathType::Value, PathType::Value]),
            search,
        ),
    ]
}

fn length(args: Vec<PathValue<'_>>) -> PathValue<'_> {
    let len = match args.into_iter().next().and_then(PathValue::into_value) {
        Some(v) => match v.as_ref() {
            Value::String(s) => s.chars().count(),
            Value::Array(arr) => arr.len(),
            Value::Object(map) => map.len(),
            _ => return PathValue::nothing(),
        },
        None => return PathValue::nothing(),
    };
    PathValue::value(len)
}

fn count(args: Vec<PathValue<'_>>) -> PathValue<'_> {
    let nodes = args
        .into_iter()
        .next()
        .map(PathValue::into_nodes)
        .unwrap_or_default();
    PathValue::value(nodes.len())
}

fn value(args: Vec<PathValue<'_>>) -> PathValue<'_> {
    let mut nodes = args
        .into_iter()
        .next()
        .map(PathValue::into_nodes)
        .unwrap_or_default();
    if nodes.len() == 1 {
        PathValue::Value(nodes.pop())
    } else {
        PathValue::nothing()
    }
}

fn full_match(args: Vec<PathValue<'_>>) -> PathValue<'_> {
    PathValue::Logical(regex_test(args, true))
}

fn search(args: Vec<PathValue<'_>>) -> PathValue<'_> {
    PathValue::Logical(regex_test(args, false))
}

fn regex_test(args: Vec<PathValue<'_>>, anchored: bool) -> bool {
    let mut args = args.into_iter().map(PathValue::into_value);
    let (Some(Some(subject)), Some(Some(pattern))) = (args.next(), args.next()) else {
        return false;
    };
    let (Value::String(subject), Value::String(pattern)) = (subject.as_ref(), pattern.as_ref())
    else {
        return false;
    };
    let cache = if anchored { &MATCH_CACHE } else { &SEARCH_CACHE };
    cached_regex(cache, pattern, anchored).is_some_and(|re| re.is_match(subject))
}

/// Get a cached regex or compile and cache a new one; None for invalid patterns
fn cached_regex(cache: &'static LocalKey<RegexCache>, pattern: &str, anchored: bool) -> Option<Regex> {
    cache.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(re) = cache.get(pattern) {
            return re.clone();
        }
        let re = translate_iregexp(pattern, anchored).and_then(|p| Regex::new(&p).ok());
        if cache.len() >= REGEX_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(pattern.to_string(), re.clone());
        re
    })
}

/// Rewrite an I-Regexp (RFC 9485) pattern into `regex` crate syntax.
///
/// `.` must not match `\n` or `\r`, and `^` and `$` outside a class are
/// ordinary characters. Both are rewritten in the parsed AST, so escaped
/// and bracketed forms are left alone. Syntax the `regex` crate accepts but
/// I-Regexp does not (`\d`, `\b`, flags, lazy repetition, non-capturing or
/// named groups, class set operations) gives None. `anchored` wraps the
/// pattern for a whole-string match.
pub(crate) fn translate_iregexp(pattern: &str, anchored: bool) -> Option<String> {
    let mut ast = ast::parse::Parser::new().parse(pattern).ok()?;
    rewrite_iregexp(&mut ast)?;

    let mut printed = String::with_capacity(pattern.len() + 8);
    ast::print::Printer::new().print(&ast, &mut printed).ok()?;
    if anchored {
        Some(format!("^(?:{printed})$"))
    } else {
        Some(printed)
    }
}

fn rewrite_iregexp(node: &mut Ast) -> Option<()> {
    match node {
        Ast::Empty(_) => {}
        Ast::Literal(literal) => is_iregexp_literal(literal).then_some(())?,
        Ast::Dot(span) => {
            let span = **span;
            *node = Ast::ClassBracketed(Box::new(not_line_terminator(span)));
        }
        Ast::Assertion(assertion) => {
            let c = match assertion.kind {
                AssertionKind::StartLine => '^',
                AssertionKind::EndLine => '$',
                _ => return None,
            };
            let span = assertion.span;
            *node = Ast::Literal(Box::new(ast::Literal {
                span,
                kind: LiteralKind::Meta,
                c,
            }));
        }
        Ast::ClassUnicode(class) => is_iregexp_property(&class.kind).then_some(())?,
        Ast::ClassBracketed(class) => match &class.kind {
            ClassSet::Item(item) => check_class_item(item)?,
            ClassSet::BinaryOp(_) => return None,
        },
        Ast::Repetition(rep) => {
            if !rep.greedy {
                return None;
            }
            rewrite_iregexp(&mut rep.ast)?;
        }
        Ast::Group(group) => match group.kind {
            GroupKind::CaptureIndex(_) => rewrite_iregexp(&mut group.ast)?,
            _ => return None,
        },
        Ast::Alternation(alt) => {
            for ast in &mut alt.asts {
                rewrite_iregexp(ast)?;
            }
        }
        Ast::Concat(concat) => {
            for ast in &mut concat.asts {
                rewrite_iregexp(ast)?;
            }
        }
        Ast::Flags(_) | Ast::ClassPerl(_) => return None,
    }
    Some(())
}

fn check_class_item(item: &ClassSetItem) -> Option<()> {
    match item {
        ClassSetItem::Empty(_) => Some(()),
        ClassSetItem::Literal(literal) => is_iregexp_literal(literal).then_some(()),
        ClassSetItem::Range(range) => {
            (is_iregexp_literal(&range.start) && is_iregexp_literal(&range.end)).then_some(())
        }
        ClassSetItem::Unicode(class) => is_iregexp_property(&class.kind).then_some(()),
        ClassSetItem::Union(union) => union.items.iter().try_for_each(check_class_item),
        ClassSetItem::Ascii(_) | ClassSetItem::Perl(_) | ClassSetItem::Bracketed(_) => None,
    }
}

/// Verbatim characters, `\n`, `\r`, `\t` and the single-character escapes
fn is_iregexp_literal(literal: &ast::Literal) -> bool {
    match &literal.kind {
        LiteralKind::Verbatim => true,
        LiteralKind::Meta => r"()*+-.?[\]^{|}".contains(literal.c),
        LiteralKind::Special(kind) => matches!(
            kind,
            SpecialLiteralKind::LineFeed
                | SpecialLiteralKind::CarriageReturn
                | SpecialLiteralKind::Tab
        ),
        _ => false,
    }
}

/// `\p{L}` and `\p{Lu}` style category escapes
fn is_iregexp_property(kind: &ClassUnicodeKind) -> bool {
    match kind {
        ClassUnicodeKind::OneLetter(_) => true,
        ClassUnicodeKind::Named(name) => name.len() <= 2,
        ClassUnicodeKind::NamedValue { .. } => false,
    }
}

/// `[^\n\r]`
fn not_line_terminator(span: Span) -> ClassBracketed {
    let literal = |kind, c| {
        ClassSetItem::Literal(ast::Literal {
            span,
            kind: LiteralKind::Special(kind),
            c,
        })
    };
    ClassBracketed {
        span,
        negated: true,
        kind: ClassSet::Item(ClassSetItem::Union(ClassSetUnion {
            span,
            items: vec![
                literal(SpecialLiteralKind::LineFeed, '\n'),
                literal(SpecialLiteralKind::CarriageReturn, '\r'),
            ],
        })),
    }
}
