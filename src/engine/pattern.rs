//! Rendering of the query program handed to an external CEP runtime.
//!
//! External engines take a textual application: one input stream
//! definition with a single string attribute, then one named pattern
//! per statement. The pattern name is the query topic, so a fired
//! pattern can be forwarded to the bus without translation.

use crate::plan::{Operator, Query, Statement};

/// Name of the stream every input event is sent to.
pub const INPUT_STREAM: &str = "eventStream";
/// Name of the stream fired patterns are inserted into.
pub const OUTPUT_STREAM: &str = "outputStream";
/// The single string attribute carrying the event/topic name.
pub const ATTRIBUTE: &str = "name";

/// Render the full application for a node's statements.
pub fn render_app(statements: &[Statement]) -> String {
    let mut parts = vec![format!(
        "define stream {} ({} string);",
        INPUT_STREAM, ATTRIBUTE
    )];
    for statement in statements {
        parts.push(render_pattern(&statement.query));
    }
    parts.join(" ")
}

/// Render one named pattern for a query. Sequence operands are chained
/// with `->`, conjunction operands with `and`; each operand matches an
/// arriving event whose name equals the operand's topic.
pub fn render_pattern(query: &Query) -> String {
    let topic = query.topic();
    let joiner = match query.operator {
        Operator::And => " and ",
        Operator::Seq => " -> ",
    };

    let terms: Vec<String> = query
        .operands
        .iter()
        .enumerate()
        .map(|(index, operand)| {
            format!(
                "e{}={}[{} == '{}']",
                index + 1,
                INPUT_STREAM,
                ATTRIBUTE,
                operand.topic()
            )
        })
        .collect();

    format!(
        "@info(name = '{}') from every {} select '{}' as {} insert into {};",
        topic,
        terms.join(joiner),
        topic,
        ATTRIBUTE,
        OUTPUT_STREAM
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sequence_pattern() {
        let query: Query = "SEQ(J, A)".parse().unwrap();
        let rendered = render_pattern(&query);
        assert_eq!(
            rendered,
            "@info(name = 'SEQ(J-A)') from every e1=eventStream[name == 'J'] \
             -> e2=eventStream[name == 'A'] select 'SEQ(J-A)' as name \
             insert into outputStream;"
        );
    }

    #[test]
    fn composite_operands_match_on_their_topic() {
        let query: Query = "AND(E, SEQ(J, A))".parse().unwrap();
        let rendered = render_pattern(&query);
        assert!(rendered.contains("e1=eventStream[name == 'E']"));
        assert!(rendered.contains("e2=eventStream[name == 'SEQ(J-A)']"));
        assert!(rendered.contains("and"));
    }

    #[test]
    fn app_defines_input_stream_once() {
        let statement = crate::plan::StatementParser::new("SELECT SEQ(J, A) FROM J, A ON {4}")
            .parse()
            .unwrap();
        let app = render_app(&[statement]);
        assert!(app.starts_with("define stream eventStream (name string);"));
        assert!(app.contains("@info(name = 'SEQ(J-A)')"));
    }
}
