// tinymop MRO - C3 linearization
//
// Pure merge over the parents' own linearizations plus the declared parent
// order. No access to the class registry: callers hand in fully computed
// parent MROs, which keeps this deterministic and side-effect free.

use crate::class::ClassId;

/// Merge the parents' MROs (in declaration order) and the parent list itself
/// into a single linearization, C3 style. The result does not include the
/// class under construction; the caller prepends it.
///
/// Returns `None` when no ordering satisfies every parent's own precedence
/// together with the declared parent order (the diamond-conflict case).
pub fn linearize(parent_mros: &[Vec<ClassId>], parents: &[ClassId]) -> Option<Vec<ClassId>> {
    let mut seqs: Vec<Vec<ClassId>> = parent_mros.to_vec();
    seqs.push(parents.to_vec());

    let mut result = Vec::new();
    while seqs.iter().any(|s| !s.is_empty()) {
        // Select the first head that is in no other sequence's tail.
        let mut candidate = None;
        for seq in &seqs {
            let Some(&head) = seq.first() else { continue };
            let in_tail = seqs
                .iter()
                .any(|other| other.len() > 1 && other[1..].contains(&head));
            if !in_tail {
                candidate = Some(head);
                break;
            }
        }
        let head = candidate?;
        result.push(head);
        for seq in seqs.iter_mut() {
            if seq.first() == Some(&head) {
                seq.remove(0);
            }
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(n: u32) -> ClassId {
        ClassId(n)
    }

    #[test]
    fn test_single_parent_chain() {
        // B(A), A(root)
        let merged = linearize(&[vec![c(2), c(1), c(0)]], &[c(2)]).unwrap();
        assert_eq!(merged, vec![c(2), c(1), c(0)]);
    }

    #[test]
    fn test_independent_parents_keep_declaration_order() {
        let a = vec![c(1), c(0)];
        let b = vec![c(2), c(0)];
        let merged = linearize(&[a, b], &[c(1), c(2)]).unwrap();
        assert_eq!(merged, vec![c(1), c(2), c(0)]);
    }

    #[test]
    fn test_diamond() {
        // A(root)=1, B(A)=2, C(A)=3, D(B,C) => [B, C, A, root]
        let b = vec![c(2), c(1), c(0)];
        let cc = vec![c(3), c(1), c(0)];
        let merged = linearize(&[b, cc], &[c(2), c(3)]).unwrap();
        assert_eq!(merged, vec![c(2), c(3), c(1), c(0)]);
    }

    #[test]
    fn test_conflicting_precedence_fails() {
        // One parent wants [1, 2], the other [2, 1].
        let x = vec![c(3), c(1), c(2), c(0)];
        let y = vec![c(4), c(2), c(1), c(0)];
        assert!(linearize(&[x, y], &[c(3), c(4)]).is_none());
    }
}
