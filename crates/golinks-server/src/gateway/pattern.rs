//! The (HTTP verb, path template) → RPC method translation table.
//!
//! Templates are segment-wise: literals match exactly, `{name}` captures a
//! string variable, `{id:int}` captures an integer variable. The table is
//! built once at startup; two templates that could match the same request
//! are a configuration error there, never a runtime tie-break.

use axum::http::Method;

/// Declared semantic kind of a path variable. The REST translator converts
/// the captured string accordingly before it reaches the method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Str,
    Int,
}

/// How the HTTP request body maps onto the request message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyMapping {
    /// Body ignored.
    None,
    /// Body object is the whole request message.
    Whole,
    /// Body becomes the named request field.
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable { name: String, kind: VarKind },
}

#[derive(Debug, Clone)]
struct Route {
    verb: Method,
    template: String,
    segments: Vec<Segment>,
    method_name: String,
    body: BodyMapping,
}

/// A resolved request: the target method, the captured variables in
/// declaration order, and the route's body mapping.
#[derive(Debug, Clone)]
pub struct ResolvedCall {
    pub method_name: String,
    pub variables: Vec<CapturedVar>,
    pub body: BodyMapping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedVar {
    pub name: String,
    pub kind: VarKind,
    pub raw: String,
}

pub struct PatternRegistryBuilder {
    routes: Vec<Route>,
}

impl Default for PatternRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternRegistryBuilder {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Declare one route. Fails on a malformed template.
    pub fn add(
        &mut self,
        verb: Method,
        template: &str,
        method_name: &str,
        body: BodyMapping,
    ) -> Result<(), String> {
        let segments = parse_template(template)?;
        self.routes.push(Route {
            verb,
            template: template.to_string(),
            segments,
            method_name: method_name.to_string(),
            body,
        });
        Ok(())
    }

    /// Finalize the table. Fails if any two routes could match the same
    /// verb and path.
    pub fn build(self) -> Result<PatternRegistry, String> {
        for (i, a) in self.routes.iter().enumerate() {
            for b in self.routes.iter().skip(i + 1) {
                if a.verb == b.verb && templates_overlap(&a.segments, &b.segments) {
                    return Err(format!(
                        "Ambiguous route templates: {} {} and {} {}",
                        a.verb, a.template, b.verb, b.template
                    ));
                }
            }
        }
        Ok(PatternRegistry {
            routes: self.routes,
        })
    }
}

/// Immutable route table, safe for unsynchronized concurrent reads.
#[derive(Debug)]
pub struct PatternRegistry {
    routes: Vec<Route>,
}

impl PatternRegistry {
    /// Match a request against the table. `None` means no route matched.
    pub fn resolve(&self, verb: &Method, path: &str) -> Option<ResolvedCall> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for route in &self.routes {
            if route.verb != *verb {
                continue;
            }
            if let Some(variables) = match_segments(&route.segments, &segments) {
                return Some(ResolvedCall {
                    method_name: route.method_name.clone(),
                    variables,
                    body: route.body.clone(),
                });
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>, String> {
    if !template.starts_with('/') {
        return Err(format!("Template {} must start with '/'", template));
    }

    let mut segments = Vec::new();
    for part in template.split('/').filter(|s| !s.is_empty()) {
        if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            let (name, kind) = match inner.split_once(':') {
                None => (inner, VarKind::Str),
                Some((name, "int")) => (name, VarKind::Int),
                Some((_, other)) => {
                    return Err(format!(
                        "Unknown variable kind '{}' in template {}",
                        other, template
                    ))
                }
            };
            if name.is_empty() {
                return Err(format!("Empty variable name in template {}", template));
            }
            segments.push(Segment::Variable {
                name: name.to_string(),
                kind,
            });
        } else if part.contains('{') || part.contains('}') {
            return Err(format!("Malformed segment '{}' in template {}", part, template));
        } else {
            segments.push(Segment::Literal(part.to_string()));
        }
    }
    Ok(segments)
}

fn match_segments(template: &[Segment], path: &[&str]) -> Option<Vec<CapturedVar>> {
    if template.len() != path.len() {
        return None;
    }
    let mut variables = Vec::new();
    for (segment, part) in template.iter().zip(path) {
        match segment {
            Segment::Literal(lit) => {
                if lit != part {
                    return None;
                }
            }
            Segment::Variable { name, kind } => {
                variables.push(CapturedVar {
                    name: name.clone(),
                    kind: *kind,
                    raw: (*part).to_string(),
                });
            }
        }
    }
    Some(variables)
}

/// Two templates overlap when some concrete path could match both: same
/// segment count, and at every position either the literals agree or at
/// least one side is a variable.
fn templates_overlap(a: &[Segment], b: &[Segment]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).all(|(x, y)| match (x, y) {
        (Segment::Literal(l1), Segment::Literal(l2)) => l1 == l2,
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PatternRegistry {
        let mut b = PatternRegistryBuilder::new();
        b.add(
            Method::GET,
            "/shortcuts",
            "golinks.api.v1.ShortcutService/ListShortcuts",
            BodyMapping::None,
        )
        .unwrap();
        b.add(
            Method::POST,
            "/shortcuts",
            "golinks.api.v1.ShortcutService/CreateShortcut",
            BodyMapping::Whole,
        )
        .unwrap();
        b.add(
            Method::GET,
            "/shortcuts/{name}",
            "golinks.api.v1.ShortcutService/GetShortcut",
            BodyMapping::None,
        )
        .unwrap();
        b.add(
            Method::GET,
            "/users/{id:int}",
            "golinks.api.v1.UserService/GetUser",
            BodyMapping::None,
        )
        .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn verb_and_path_select_distinct_methods() {
        let r = registry();
        assert_eq!(
            r.resolve(&Method::GET, "/shortcuts").unwrap().method_name,
            "golinks.api.v1.ShortcutService/ListShortcuts"
        );
        assert_eq!(
            r.resolve(&Method::POST, "/shortcuts").unwrap().method_name,
            "golinks.api.v1.ShortcutService/CreateShortcut"
        );
    }

    #[test]
    fn variables_are_captured_in_order() {
        let r = registry();
        let call = r.resolve(&Method::GET, "/shortcuts/my-link").unwrap();
        assert_eq!(
            call.method_name,
            "golinks.api.v1.ShortcutService/GetShortcut"
        );
        assert_eq!(
            call.variables,
            vec![CapturedVar {
                name: "name".to_string(),
                kind: VarKind::Str,
                raw: "my-link".to_string(),
            }]
        );
    }

    #[test]
    fn int_kind_is_recorded() {
        let r = registry();
        let call = r.resolve(&Method::GET, "/users/42").unwrap();
        assert_eq!(call.variables[0].kind, VarKind::Int);
        assert_eq!(call.variables[0].raw, "42");
    }

    #[test]
    fn misses_are_none() {
        let r = registry();
        assert!(r.resolve(&Method::DELETE, "/shortcuts").is_none());
        assert!(r.resolve(&Method::GET, "/unknown").is_none());
        assert!(r.resolve(&Method::GET, "/shortcuts/a/b").is_none());
    }

    #[test]
    fn trailing_slash_is_tolerated() {
        let r = registry();
        assert!(r.resolve(&Method::GET, "/shortcuts/").is_some());
    }

    #[test]
    fn ambiguous_templates_fail_at_build() {
        let mut b = PatternRegistryBuilder::new();
        b.add(Method::GET, "/shortcuts/{name}", "a/A", BodyMapping::None)
            .unwrap();
        b.add(Method::GET, "/shortcuts/recent", "b/B", BodyMapping::None)
            .unwrap();
        let err = b.build().unwrap_err();
        assert!(err.contains("Ambiguous"));
    }

    #[test]
    fn same_template_different_verbs_is_fine() {
        let mut b = PatternRegistryBuilder::new();
        b.add(Method::GET, "/x/{id}", "a/A", BodyMapping::None).unwrap();
        b.add(Method::DELETE, "/x/{id}", "b/B", BodyMapping::None)
            .unwrap();
        assert!(b.build().is_ok());
    }

    #[test]
    fn malformed_templates_are_rejected() {
        let mut b = PatternRegistryBuilder::new();
        assert!(b.add(Method::GET, "/x/{id:float}", "a/A", BodyMapping::None).is_err());
        assert!(b.add(Method::GET, "/x/{}", "a/A", BodyMapping::None).is_err());
        assert!(b.add(Method::GET, "x/{id}", "a/A", BodyMapping::None).is_err());
        assert!(b.add(Method::GET, "/x/{id", "a/A", BodyMapping::None).is_err());
    }
}
