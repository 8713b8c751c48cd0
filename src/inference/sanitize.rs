//! Response sanitizing
//!
//! llama.cpp prints the prompt back before the generated continuation.

/// Remove every literal occurrence of `input` from the raw model output
///
/// Occurrences are removed anywhere in the text, not only a leading echo, so
/// generated text that repeats the prompt verbatim is dropped as well.
pub fn sanitize(raw: &str, input: &str) -> String {
    if input.is_empty() {
        return raw.to_string();
    }
    raw.replace(input, "")
}
