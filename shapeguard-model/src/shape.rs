use crate::FieldDescriptor;

/// Ordered mapping from field name to descriptor.
///
/// Iteration follows insertion order. Inserting a name that already exists
/// replaces its descriptor without moving it.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    fields: Vec<(String, FieldDescriptor)>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    /// Inserts or replaces a field, returning the previous descriptor.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: FieldDescriptor,
    ) -> Option<FieldDescriptor> {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, descriptor)),
            None => {
                self.fields.push((name, descriptor));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FieldDescriptor)> for Shape {
    fn from_iter<I: IntoIterator<Item = (S, FieldDescriptor)>>(iter: I) -> Self {
        let mut shape = Shape::new();
        for (name, descriptor) in iter {
            shape.insert(name, descriptor);
        }
        shape
    }
}

impl<S: Into<String>> Extend<(S, FieldDescriptor)> for Shape {
    fn extend<I: IntoIterator<Item = (S, FieldDescriptor)>>(&mut self, iter: I) {
        for (name, descriptor) in iter {
            self.insert(name, descriptor);
        }
    }
}
