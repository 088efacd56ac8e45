//! Shared container handles and value identities.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// NodeId is the identity of a container value.
///
/// Two `Value`s share a NodeId exactly when they are handles to the same
/// container instance. Identities are only meaningful while the container
/// is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw identity.
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Node is a shared, interior-mutable handle to container data.
///
/// Cloning a Node clones the handle, not the data, so a container can be
/// referenced from several places (including from inside itself).
pub struct Node<T>(Rc<RefCell<T>>);

impl<T> Node<T> {
    /// Wraps container data in a new node.
    pub fn new(data: T) -> Self {
        Node(Rc::new(RefCell::new(data)))
    }

    /// Returns the identity of this node.
    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    /// Returns true if both handles point to the same container.
    pub fn ptr_eq(&self, other: &Node<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Immutably borrows the container data.
    ///
    /// Panics if the container is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the container data.
    ///
    /// Panics if the container is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Node(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(&self.id()).finish()
    }
}
