// ============================================================================
// spark-marker - Element
// A minimal retained element tree: what a marker places on the map surface
// ============================================================================
//
// Elements form a tree with strong child links and weak parent links, so a
// detached subtree is freed as soon as nobody holds a handle to it.
// `Element` is a cheap, clonable handle; equality is identity.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::constants::DEFAULT_TAG;

// =============================================================================
// ELEMENT INNER
// =============================================================================

struct ElementInner {
    tag: String,
    classes: RefCell<Vec<String>>,
    /// Inline `transform` style, e.g. `translate(10px, 20px)`
    transform: RefCell<Option<String>>,
    parent: RefCell<Weak<ElementInner>>,
    children: RefCell<Vec<Rc<ElementInner>>>,
}

// =============================================================================
// ELEMENT
// =============================================================================

/// Handle to a node in the element tree.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    /// Create a detached element with the given tag.
    pub fn create(tag: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                tag: tag.into(),
                classes: RefCell::new(Vec::new()),
                transform: RefCell::new(None),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Add a class; adding one twice is a no-op.
    pub fn add_class(&self, class: &str) {
        let mut classes = self.inner.classes.borrow_mut();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.inner.classes.borrow().iter().any(|c| c == class)
    }

    // =========================================================================
    // Style
    // =========================================================================

    pub fn set_transform(&self, value: impl Into<String>) {
        *self.inner.transform.borrow_mut() = Some(value.into());
    }

    pub fn transform(&self) -> Option<String> {
        self.inner.transform.borrow().clone()
    }

    // =========================================================================
    // Tree
    // =========================================================================

    /// Append `child` as the last child of this element.
    ///
    /// A child that already has a parent is moved, never duplicated.
    pub fn append_child(&self, child: &Element) {
        child.remove();
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.children.borrow_mut().push(child.inner.clone());
    }

    /// Detach this element from its parent. No-op when already detached.
    pub fn remove(&self) {
        let parent = self.inner.parent.borrow().upgrade();
        if let Some(parent) = parent {
            parent
                .children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(c, &self.inner));
        }
        *self.inner.parent.borrow_mut() = Weak::new();
    }

    pub fn parent(&self) -> Option<Element> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Element { inner })
    }

    pub fn children(&self) -> Vec<Element> {
        self.inner
            .children
            .borrow()
            .iter()
            .map(|inner| Element {
                inner: inner.clone(),
            })
            .collect()
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        let mut current = Some(other.inner.clone());
        while let Some(node) = current {
            if Rc::ptr_eq(&node, &self.inner) {
                return true;
            }
            current = node.parent.borrow().upgrade();
        }
        false
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::create(DEFAULT_TAG)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.inner.tag)
            .field("classes", &self.inner.classes.borrow())
            .field("transform", &self.inner.transform.borrow())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
