//! Match Tree
//!
//! Successor generator for abstract operators: a trie keyed by the
//! pattern's propositional variables in fixed order. Each internal node
//! tests one variable and fans out per value, plus a "star" edge for
//! operators that do not constrain that variable. A lookup walks the
//! concrete-value child and the star child at every level, collecting
//! every operator whose propositional preconditions hold in the given
//! abstract state, in time proportional to the pattern size.

/// Internal trie node.
struct Node {
    /// Operators whose preconditions are fully consumed at this node.
    operators: Vec<usize>,
    test: Option<NodeTest>,
}

struct NodeTest {
    /// Pattern position this node branches on.
    pattern_index: usize,
    /// One child per domain value.
    successors: Vec<Option<Box<Node>>>,
    /// Child for operators without a precondition on this variable.
    star: Option<Box<Node>>,
}

impl Node {
    fn leaf() -> Box<Node> {
        Box::new(Node { operators: Vec::new(), test: None })
    }
}

/// Trie over abstract propositional states.
pub struct MatchTree {
    /// Domain size per pattern position.
    domain_sizes: Vec<usize>,
    /// Mixed-radix weight per pattern position.
    hash_multipliers: Vec<usize>,
    root: Option<Box<Node>>,
}

impl MatchTree {
    pub fn new(domain_sizes: Vec<usize>, hash_multipliers: Vec<usize>) -> MatchTree {
        MatchTree { domain_sizes, hash_multipliers, root: None }
    }

    /// Insert an operator along the path of its preconditions.
    ///
    /// `preconditions` are `(pattern position, value)` pairs sorted by
    /// position, duplicate-free.
    pub fn insert(&mut self, op_index: usize, preconditions: &[(usize, usize)]) {
        let domain_sizes = &self.domain_sizes;
        insert_at(&mut self.root, op_index, preconditions, domain_sizes);
    }

    /// All operators whose preconditions hold in the abstract state
    /// `prop_hash`.
    pub fn applicable_operators(&self, prop_hash: usize) -> Vec<usize> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            self.collect(root, prop_hash, &mut out);
        }
        out
    }

    fn collect(&self, node: &Node, prop_hash: usize, out: &mut Vec<usize>) {
        out.extend_from_slice(&node.operators);
        if let Some(test) = &node.test {
            let value = (prop_hash / self.hash_multipliers[test.pattern_index])
                % self.domain_sizes[test.pattern_index];
            if let Some(child) = &test.successors[value] {
                self.collect(child, prop_hash, out);
            }
            if let Some(star) = &test.star {
                self.collect(star, prop_hash, out);
            }
        }
    }
}

fn insert_at(
    slot: &mut Option<Box<Node>>,
    op_index: usize,
    preconditions: &[(usize, usize)],
    domain_sizes: &[usize],
) {
    let node = slot.get_or_insert_with(Node::leaf);
    let Some(&(var, value)) = preconditions.first() else {
        node.operators.push(op_index);
        return;
    };

    match &mut node.test {
        None => {
            node.test = Some(NodeTest {
                pattern_index: var,
                successors: (0..domain_sizes[var]).map(|_| None).collect(),
                star: None,
            });
            let test = node.test.as_mut().expect("test just created");
            insert_at(&mut test.successors[value], op_index, &preconditions[1..], domain_sizes);
        }
        Some(test) if test.pattern_index == var => {
            insert_at(&mut test.successors[value], op_index, &preconditions[1..], domain_sizes);
        }
        Some(test) if test.pattern_index < var => {
            // This node tests a variable the operator does not constrain.
            insert_at(&mut test.star, op_index, preconditions, domain_sizes);
        }
        Some(_) => {
            // The operator constrains an earlier variable than this node
            // tests; interpose a fresh node and hang the old one off its
            // star edge.
            let old = slot.take().expect("node exists");
            let mut fresh = Box::new(Node {
                operators: Vec::new(),
                test: Some(NodeTest {
                    pattern_index: var,
                    successors: (0..domain_sizes[var]).map(|_| None).collect(),
                    star: Some(old),
                }),
            });
            let test = fresh.test.as_mut().expect("test just created");
            insert_at(&mut test.successors[value], op_index, &preconditions[1..], domain_sizes);
            *slot = Some(fresh);
        }
    }
}
