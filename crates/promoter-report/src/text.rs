//! Small text helpers shared by the renderers.

/// Join items as natural-language prose: `a`, `a and b`, `a, b and c`.
pub fn and_join<S: AsRef<str>>(items: &[S]) -> String {
  match items {
    [] => String::new(),
    [only] => only.as_ref().to_string(),
    [init @ .., last] => {
      let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
      format!("{} and {}", head.join(", "), last.as_ref())
    }
  }
}

/// Right-pad every string to the length of the longest one.
pub(crate) fn pad<S: AsRef<str>>(items: &[S]) -> Vec<String> {
  let width = items
    .iter()
    .map(|s| s.as_ref().chars().count())
    .max()
    .unwrap_or(0);
  items
    .iter()
    .map(|s| format!("{:<width$}", s.as_ref()))
    .collect()
}

/// `catalog` or `catalogs`, depending on how many there are.
pub(crate) fn catalog_noun(count: usize) -> &'static str {
  if count > 1 { "catalogs" } else { "catalog" }
}
