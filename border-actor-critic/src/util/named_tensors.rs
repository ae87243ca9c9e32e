use crate::error::AcNetError;
use std::{collections::HashMap, iter::FromIterator, path::Path};
use tch::{nn::VarStore, Device::Cpu, Tensor};

/// Snapshot of the parameters of a network, keyed by variable name.
///
/// Tensors are deep copies on CPU, so the snapshot does not change when the
/// network is trained afterwards.
pub struct NamedTensors {
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copy data of VarStore to CPU.
    pub fn copy_from(vs: &VarStore) -> Self {
        let src = vs.variables();

        tch::no_grad(|| NamedTensors {
            named_tensors: HashMap::from_iter(
                src.iter()
                    .map(|(k, v)| (k.clone(), v.detach().to(Cpu).copy())),
            ),
        })
    }

    /// Checks that the snapshot has exactly the variables of `vs` with the same shapes.
    pub fn check(&self, vs: &VarStore) -> Result<(), AcNetError> {
        let dest = vs.variables();

        for (name, t) in dest.iter() {
            match self.named_tensors.get(name) {
                None => return Err(AcNetError::MissingVariable(name.clone())),
                Some(src) if src.size() != t.size() => {
                    return Err(AcNetError::ShapeMismatch {
                        what: name.clone(),
                        expected: t.size(),
                        actual: src.size(),
                    })
                }
                Some(_) => {}
            }
        }

        match self.named_tensors.keys().find(|k| !dest.contains_key(*k)) {
            Some(name) => Err(AcNetError::UnexpectedVariable(name.clone())),
            None => Ok(()),
        }
    }

    /// Copy named tensors to [VarStore].
    ///
    /// Nothing is copied if [`NamedTensors::check`] fails.
    pub fn copy_to(&self, vs: &mut VarStore) -> Result<(), AcNetError> {
        self.check(vs)?;

        let src = &self.named_tensors;
        let dest = &mut vs.variables();

        tch::no_grad(|| -> Result<(), AcNetError> {
            for (name, src) in src.iter() {
                if let Some(dest) = dest.get_mut(name) {
                    dest.f_copy_(src)?;
                }
            }
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.named_tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named_tensors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.named_tensors.get(name)
    }

    /// Writes the tensors to a file in the libtorch format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<(), AcNetError> {
        let mut named = self.named_tensors.iter().collect::<Vec<_>>();
        named.sort_by(|a, b| a.0.cmp(b.0));
        Tensor::save_multi(&named, path)?;
        Ok(())
    }

    /// Reads tensors written by [`NamedTensors::save`].
    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self, AcNetError> {
        let named = Tensor::load_multi(path)?;
        Ok(Self {
            named_tensors: HashMap::from_iter(named.into_iter()),
        })
    }
}

impl Clone for NamedTensors {
    fn clone(&self) -> Self {
        let src = &self.named_tensors;

        tch::no_grad(|| NamedTensors {
            named_tensors: HashMap::from_iter(src.iter().map(|(k, v)| (k.clone(), v.copy()))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::Init, Device, Kind};

    fn var_store(out_dim: i64) -> VarStore {
        let vs = VarStore::new(Device::Cpu);
        let p = vs.root();
        let _ = p.var("w", &[out_dim, 2], Init::Uniform { lo: -1.0, up: 1.0 });
        let _ = p.var("b", &[out_dim], Init::Const(0.5));
        vs
    }

    #[test]
    fn test_copy_from_is_deep() {
        let vs = var_store(3);
        let snapshot = NamedTensors::copy_from(&vs);
        let w = snapshot.get("w").unwrap().copy();

        tch::no_grad(|| {
            let _ = vs.variables().get_mut("w").unwrap().fill_(7.0);
        });

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("w").unwrap().equal(&w));
    }

    #[test]
    fn test_copy_to() {
        let src = var_store(3);
        let mut dest = var_store(3);
        NamedTensors::copy_from(&src).copy_to(&mut dest).unwrap();

        let src = src.variables();
        let dest = dest.variables();
        assert!(src["w"].equal(&dest["w"]));
        assert!(src["b"].equal(&dest["b"]));
    }

    #[test]
    fn test_copy_to_shape_mismatch() {
        let src = var_store(3);
        let mut dest = var_store(4);
        let before = dest.variables()["w"].copy();
        let res = NamedTensors::copy_from(&src).copy_to(&mut dest);

        assert!(matches!(res, Err(AcNetError::ShapeMismatch { .. })));
        assert!(dest.variables()["w"].equal(&before));
    }

    #[test]
    fn test_check_names() {
        let vs = var_store(3);

        let mut snapshot = NamedTensors::copy_from(&vs);
        snapshot.named_tensors.remove("b");
        assert!(matches!(
            snapshot.check(&vs),
            Err(AcNetError::MissingVariable(name)) if name == "b"
        ));

        let mut snapshot = NamedTensors::copy_from(&vs);
        snapshot
            .named_tensors
            .insert("c".to_string(), Tensor::zeros([1], (Kind::Float, Device::Cpu)));
        assert!(matches!(
            snapshot.check(&vs),
            Err(AcNetError::UnexpectedVariable(name)) if name == "c"
        ));
    }
}
