/// Builds a [`Value`](crate::Value) tree from a JSON-like literal.
///
/// Every array and object literal creates a fresh container. Bind a container to a
/// variable and splice it in as an expression to share it.
///
/// ```rust
/// use serde_cyclic::{graph, to_string};
///
/// let leaf = graph!({ "a": null });
/// let root = graph!({ "a": (leaf.clone()), "b": (leaf.clone()), "n": [1, 2.5, "x", true] });
/// assert_eq!(
///     to_string(&root).unwrap(),
///     r#"{"a":{"a":null},"b":{"a":null},"n":[1,2.5,"x",true]}"#
/// );
/// ```
#[macro_export]
macro_rules! graph {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::array(vec![$($crate::graph!($elem)),*])
    };

    ({}) => {
        $crate::Value::from($crate::ObjectMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ObjectMap::new();
        $(
            object.insert($key.to_string(), $crate::graph!($value));
        )*
        $crate::Value::from(object)
    }};

    // Literals and parenthesized expressions
    ($e:expr) => {
        $crate::Value::from($e)
    };
}
