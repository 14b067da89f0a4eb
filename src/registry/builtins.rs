use std::borrow::Cow;
use std::cmp::Ordering;

use super::{Builtin, Registry, RegistryBuilder, Signature};
use crate::context::EvalContext;
use crate::interpreter::Value;
use crate::registry::kana;
use crate::types::{BOOLEAN, DATE, NUMBER, STRING, TEST, TEST_RECORD, Type};

const HOUR_MS: f64 = 3600.0 * 1000.0;
const DAY_MS: f64 = 24.0 * HOUR_MS;

fn sig<F>(params: &[&Type], ret: &Type, body: F) -> Signature
where
    F: for<'a> Fn(&EvalContext<'a>, Vec<Value<'a>>) -> Value<'a> + Send + Sync + 'static,
{
    Signature::new(params.iter().map(|&t| t.clone()).collect(), ret.clone(), body)
}

fn list(inner: &Type) -> Type {
    Type::list(inner.clone())
}

fn borrowed(text: &str) -> Value<'_> {
    Value::String(Cow::Borrowed(text))
}

pub(super) fn standard() -> Registry {
    let mut b = RegistryBuilder::new();
    text(&mut b);
    comparison(&mut b);
    logic(&mut b);
    arithmetic(&mut b);
    ranges(&mut b);
    accessors(&mut b);
    durations(&mut b);
    test_history(&mut b);
    b.build()
}

// ---- Text ----

/// Haystack first, needle second. The list form holds when any element matches.
fn text_matcher(b: &mut RegistryBuilder, builtin: Builtin, matches: fn(&str, &str) -> bool) {
    b.define(
        builtin,
        sig(&[&list(&STRING), &STRING], &BOOLEAN, move |_, args| {
            let needle = args[1].as_str();
            Value::Boolean(args[0].as_list().iter().any(|hay| matches(hay.as_str(), needle)))
        }),
    );
    b.define(
        builtin,
        sig(&[&STRING, &STRING], &BOOLEAN, move |_, args| {
            Value::Boolean(matches(args[0].as_str(), args[1].as_str()))
        }),
    );
}

fn text(b: &mut RegistryBuilder) {
    text_matcher(b, Builtin::Contains, |hay, needle| hay.contains(needle));
    text_matcher(b, Builtin::StartsWith, |hay, needle| hay.starts_with(needle));
    text_matcher(b, Builtin::EndsWith, |hay, needle| hay.ends_with(needle));

    b.define(
        Builtin::Kana,
        sig(&[&STRING], &STRING, |_, args| {
            let input = args[0].as_str();
            match kana::to_hiragana(input) {
                Some(hiragana) => Value::String(Cow::Owned(hiragana)),
                None => args[0].clone(),
            }
        }),
    );
    b.define(
        Builtin::Empty,
        sig(&[&list(&STRING)], &BOOLEAN, |_, args| Value::Boolean(args[0].as_list().is_empty())),
    );
    b.define(
        Builtin::LengthOf,
        sig(&[&STRING], &NUMBER, |_, args| Value::Number(args[0].as_str().chars().count() as f64)),
    );
    b.define(
        Builtin::LengthOf,
        sig(&[&list(&STRING)], &NUMBER, |_, args| Value::Number(args[0].as_list().len() as f64)),
    );
    b.define(
        Builtin::LengthOf,
        sig(&[&list(&TEST_RECORD)], &NUMBER, |_, args| Value::Number(args[0].as_list().len() as f64)),
    );
}

// ---- Comparison ----

fn compare_numbers(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    a.as_number().partial_cmp(&b.as_number())
}

fn compare_strings(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    Some(a.as_str().cmp(b.as_str()))
}

fn compare_dates(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    Some(a.as_date().cmp(&b.as_date()))
}

/// Adds one signature per comparison operator for `ty`. Unordered operands (NaN) satisfy only `!=`.
fn comparable(b: &mut RegistryBuilder, ty: &Type, cmp: fn(&Value<'_>, &Value<'_>) -> Option<Ordering>) {
    let family: [(Builtin, fn(Ordering) -> bool); 6] = [
        (Builtin::Eq, Ordering::is_eq),
        (Builtin::Ne, Ordering::is_ne),
        (Builtin::Lt, Ordering::is_lt),
        (Builtin::Gt, Ordering::is_gt),
        (Builtin::Le, Ordering::is_le),
        (Builtin::Ge, Ordering::is_ge),
    ];
    for (builtin, holds) in family {
        let unordered = builtin == Builtin::Ne;
        b.define(
            builtin,
            sig(&[ty, ty], &BOOLEAN, move |_, args| {
                Value::Boolean(cmp(&args[0], &args[1]).map_or(unordered, holds))
            }),
        );
    }
}

fn comparison(b: &mut RegistryBuilder) {
    comparable(b, &NUMBER, compare_numbers);
    comparable(b, &STRING, compare_strings);
    comparable(b, &DATE, compare_dates);

    // `equals` doubles as a text matcher
    b.define(
        Builtin::Eq,
        sig(&[&list(&STRING), &STRING], &BOOLEAN, |_, args| {
            let needle = args[1].as_str();
            Value::Boolean(args[0].as_list().iter().any(|v| v.as_str() == needle))
        }),
    );
}

// ---- Logic ----

fn logic(b: &mut RegistryBuilder) {
    b.define(Builtin::True, sig(&[], &BOOLEAN, |_, _| Value::Boolean(true)));
    b.define(Builtin::False, sig(&[], &BOOLEAN, |_, _| Value::Boolean(false)));
    b.define(
        Builtin::And,
        sig(&[&BOOLEAN, &BOOLEAN], &BOOLEAN, |_, args| {
            Value::Boolean(args[0].as_bool() && args[1].as_bool())
        }),
    );
    b.define(
        Builtin::Or,
        sig(&[&BOOLEAN, &BOOLEAN], &BOOLEAN, |_, args| {
            Value::Boolean(args[0].as_bool() || args[1].as_bool())
        }),
    );
    b.define(Builtin::Not, sig(&[&BOOLEAN], &BOOLEAN, |_, args| Value::Boolean(!args[0].as_bool())));
}

// ---- Arithmetic ----

fn arithmetic(b: &mut RegistryBuilder) {
    b.define(
        Builtin::Add,
        sig(&[&NUMBER, &NUMBER], &NUMBER, |_, args| Value::Number(args[0].as_number() + args[1].as_number())),
    );
    b.define(
        Builtin::Add,
        sig(&[&DATE, &NUMBER], &DATE, |_, args| Value::Date(args[0].as_date().offset(args[1].as_number()))),
    );
    b.define(
        Builtin::Add,
        sig(&[&NUMBER, &DATE], &DATE, |_, args| Value::Date(args[1].as_date().offset(args[0].as_number()))),
    );

    b.define(
        Builtin::Subtract,
        sig(&[&NUMBER, &NUMBER], &NUMBER, |_, args| Value::Number(args[0].as_number() - args[1].as_number())),
    );
    b.define(
        Builtin::Subtract,
        sig(&[&DATE, &DATE], &NUMBER, |_, args| Value::Number(args[0].as_date().since(args[1].as_date()))),
    );
    b.define(
        Builtin::Subtract,
        sig(&[&DATE, &NUMBER], &DATE, |_, args| Value::Date(args[0].as_date().offset(-args[1].as_number()))),
    );
    // prefix negation: `easiness > -1`
    b.define(Builtin::Subtract, sig(&[&NUMBER], &NUMBER, |_, args| Value::Number(-args[0].as_number())));

    b.define(
        Builtin::Multiply,
        sig(&[&NUMBER, &NUMBER], &NUMBER, |_, args| Value::Number(args[0].as_number() * args[1].as_number())),
    );
    b.define(
        Builtin::Divide,
        sig(&[&NUMBER, &NUMBER], &NUMBER, |_, args| Value::Number(args[0].as_number() / args[1].as_number())),
    );
}

// ---- Ranges ----

fn ranges(b: &mut RegistryBuilder) {
    for ty in [&NUMBER, &DATE] {
        b.define(
            Builtin::Range,
            sig(&[ty, ty], &Type::range(ty.clone()), |_, args| Value::Range {
                start: Box::new(args[0].clone()),
                end: Box::new(args[1].clone()),
            }),
        );
    }

    // Number ranges include both bounds.
    b.define(
        Builtin::In,
        sig(&[&NUMBER, &Type::range(NUMBER.clone())], &BOOLEAN, |_, args| {
            let n = args[0].as_number();
            let (start, end) = args[1].as_range();
            Value::Boolean(start.as_number() <= n && n <= end.as_number())
        }),
    );
    // Date ranges include the start and exclude the end, like calendar intervals.
    b.define(
        Builtin::In,
        sig(&[&DATE, &Type::range(DATE.clone())], &BOOLEAN, |_, args| {
            let d = args[0].as_date();
            let (start, end) = args[1].as_range();
            Value::Boolean(start.as_date() <= d && d < end.as_date())
        }),
    );
}

// ---- Word accessors ----

fn accessors(b: &mut RegistryBuilder) {
    b.define(Builtin::Now, sig(&[], &DATE, |ctx, _| Value::Date(ctx.now)));
    b.define(Builtin::Easiness, sig(&[], &NUMBER, |ctx, _| Value::Number(ctx.word.mem.easiness)));

    b.define(
        Builtin::Text,
        sig(&[], &list(&STRING), |ctx, _| {
            let word = ctx.word;
            Value::List(vec![borrowed(&word.disp), borrowed(&word.sub)])
        }),
    );
    b.define(Builtin::Disp, sig(&[], &STRING, |ctx, _| borrowed(&ctx.word.disp)));
    b.define(Builtin::Sub, sig(&[], &STRING, |ctx, _| borrowed(&ctx.word.sub)));
    b.define(
        Builtin::Meaning,
        sig(&[], &list(&STRING), |ctx, _| {
            Value::List(ctx.word.meanings().into_iter().map(borrowed).collect())
        }),
    );
    b.define(
        Builtin::Sentence,
        sig(&[], &list(&STRING), |ctx, _| {
            Value::List(ctx.sentences().into_iter().map(Value::String).collect())
        }),
    );
    b.define(
        Builtin::Doc,
        sig(&[], &list(&STRING), |ctx, _| {
            let meanings = ctx.word.meanings().into_iter().map(borrowed);
            Value::List(meanings.chain(ctx.sentences().into_iter().map(Value::String)).collect())
        }),
    );

    b.define(Builtin::Testable, sig(&[], &BOOLEAN, |ctx, _| Value::Boolean(ctx.word.mem.test_after < ctx.now)));
    b.define(Builtin::CreateTime, sig(&[], &DATE, |ctx, _| Value::Date(ctx.word.mem.create_time)));
    b.define(Builtin::NextTestTime, sig(&[], &DATE, |ctx, _| Value::Date(ctx.word.mem.test_after)));
}

// ---- Durations, in milliseconds ----

fn durations(b: &mut RegistryBuilder) {
    let units = [
        (Builtin::Hour, HOUR_MS),
        (Builtin::Day, DAY_MS),
        (Builtin::Month, 30.0 * DAY_MS),
        (Builtin::Year, 365.0 * DAY_MS),
    ];
    for (builtin, unit) in units {
        b.define(builtin, sig(&[&NUMBER], &NUMBER, move |_, args| Value::Number(args[0].as_number() * unit)));
    }
}

// ---- Test history ----

fn test_history(b: &mut RegistryBuilder) {
    let constants = [(Builtin::Correct, 1.0), (Builtin::HalfCorrect, 0.5), (Builtin::Wrong, 0.0)];
    for (builtin, score) in constants {
        b.define(builtin, sig(&[], &NUMBER, move |_, _| Value::Number(score)));
    }

    b.define(
        Builtin::TestRec,
        sig(&[], &list(&TEST_RECORD), |ctx, _| {
            let word = ctx.word;
            Value::List(word.mem.test_rec.iter().map(Value::TestRecord).collect())
        }),
    );
    b.define(
        Builtin::Tests,
        sig(&[], &list(&TEST), |ctx, _| Value::List(ctx.tests.iter().map(Value::Test).collect())),
    );
    b.define(
        Builtin::TestIndex,
        sig(&[&list(&TEST), &NUMBER], &Type::maybe(TEST.clone()), |_, args| {
            let id = args[1].as_number();
            let found = args[0].as_list().iter().find(|t| t.as_test().id as f64 == id);
            Value::Maybe(found.map(|t| Box::new(t.clone())))
        }),
    );

    b.define(
        Builtin::InTest,
        sig(&[&Type::maybe(TEST.clone())], &BOOLEAN, |ctx, args| {
            let word_id = ctx.word.id;
            Value::Boolean(args[0].as_maybe().is_some_and(|t| t.as_test().contains_word(word_id)))
        }),
    );
    // Holds when the word was answered in the test with at least the given correctness.
    b.define(
        Builtin::InTest,
        sig(&[&Type::maybe(TEST.clone()), &NUMBER], &BOOLEAN, |ctx, args| {
            let word_id = ctx.word.id;
            let threshold = args[1].as_number();
            let score = args[0].as_maybe().and_then(|t| t.as_test().correctness_of(word_id));
            Value::Boolean(score.is_some_and(|s| s >= threshold))
        }),
    );
}
