//! Parse and manipulate URL paths.

/// An URL path.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(String);

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Return a reference to the inner [`str`] slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the [`Path`] and return the inner [`String`].
    pub fn into_string(self) -> String {
        self.0
    }

    /// Check if the path is absolute.
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    /// Return an iterator over the [`Component`]s of the path.
    pub fn components(&self) -> Components {
        let rest = self.0.strip_prefix('/').unwrap_or(&self.0);
        Components {
            root: self.is_absolute(),
            segments: (!self.0.is_empty()).then(|| rest.split('/')),
        }
    }

    /// Merge a relative reference path with `self` as the base path.
    ///
    /// When the base URL has an authority and an empty path, the result is
    /// rooted.
    pub fn merge(&self, reference: impl AsRef<str>, has_authority: bool) -> Self {
        let reference = reference.as_ref();
        if has_authority && self.0.is_empty() {
            return Self(format!("/{reference}"));
        }
        match self.0.rfind('/') {
            Some(i) => Self(format!("{}{reference}", &self.0[..=i])),
            None => Self(reference.to_owned()),
        }
    }

    /// Remove `.` and `..` segments.
    pub fn remove_dot_segments(&self) -> Self {
        let mut output: Vec<&str> = Vec::new();
        let mut root = false;
        let mut trailing_slash = false;

        let mut components = self.components().peekable();
        while let Some(component) = components.next() {
            let last = components.peek().is_none();
            match component {
                Component::RootDir => root = true,
                Component::CurDir => trailing_slash = last,
                Component::ParentDir => {
                    output.pop();
                    trailing_slash = last;
                },
                Component::Normal(s) => {
                    output.push(s);
                    trailing_slash = false;
                },
            }
        }

        let mut path = String::with_capacity(self.0.len());
        if root {
            path.push('/');
        }
        path.push_str(&output.join("/"));
        if trailing_slash && !output.is_empty() {
            path.push('/');
        }
        Self(path)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<T> From<T> for Path
where
    T: Into<String>,
{
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

/// An iterator over the [`Component`]s of a [`Path`].
#[derive(Debug)]
pub struct Components<'a> {
    root: bool,
    segments: Option<std::str::Split<'a, char>>,
}

/// An URL path component.
#[derive(Debug, PartialEq)]
pub enum Component<'a> {
    /// The root directory component (`/`).
    RootDir,
    /// A reference to the current directory (`.`).
    CurDir,
    /// A reference to the parent directory (`..`).
    ParentDir,
    /// A normal component, possibly empty.
    Normal(&'a str),
}

impl<'a> Iterator for Components<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.root {
            self.root = false;
            return Some(Component::RootDir);
        }
        self.segments.as_mut()?.next().map(|segment| match segment {
            "." => Component::CurDir,
            ".." => Component::ParentDir,
            s => Component::Normal(s),
        })
    }
}

impl Component<'_> {
    /// Return the component as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::RootDir => "/",
            Self::CurDir => ".",
            Self::ParentDir => "..",
            Self::Normal(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Component, Path};

    #[test]
    fn components() {
        const CASES: [(&str, &[Component]); 5] = [
            ("", &[]),
            ("/", &[Component::RootDir, Component::Normal("")]),
            (
                "/a/./b/",
                &[
                    Component::RootDir,
                    Component::Normal("a"),
                    Component::CurDir,
                    Component::Normal("b"),
                    Component::Normal(""),
                ],
            ),
            ("../a", &[Component::ParentDir, Component::Normal("a")]),
            ("a", &[Component::Normal("a")]),
        ];

        for (input, expected) in CASES {
            let path = Path::from(input);
            let result: Vec<Component> = path.components().collect();
            assert_eq!(result, expected, "\ncomponents of {input:?}");
        }
    }

    #[test]
    fn remove_dot_segments() {
        const CASES: [(&str, &str); 8] = [
            ("/a/b/c/./../../g", "/a/g"),
            ("mid/content=5/../6", "mid/6"),
            ("/b/c/..", "/b/"),
            ("/b/c/../..", "/"),
            ("/b/c/.", "/b/c/"),
            ("/a/b/", "/a/b/"),
            ("/", "/"),
            ("", ""),
        ];

        for (input, expected) in CASES {
            let result = Path::from(input).remove_dot_segments();
            assert_eq!(result.as_str(), expected, "\nremove_dot_segments({input:?})");
        }
    }

    #[test]
    fn merge() {
        assert_eq!(Path::from("/b/c/d;p").merge("g", true).as_str(), "/b/c/g");
        assert_eq!(Path::new().merge("g", true).as_str(), "/g");
        assert_eq!(Path::from("d").merge("g", false).as_str(), "g");
    }
}
