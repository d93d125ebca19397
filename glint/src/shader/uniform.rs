//! Uniform values.
//!
//! Anything implementing [`Uniformable`] can be passed to
//! [`Program::set_uniform`](crate::shader::Program::set_uniform):
//!
//! - scalars: `f32`, `i32`, `u32` and `f64`;
//! - vectors: `[T; 2]`, `[T; 3]` and `[T; 4]` of those;
//! - column-major matrices of `f32` and `f64`: `[[T; R]; C]` is a matrix of `C` columns of `R`
//!   rows, for `C` and `R` in `2..=4`;
//! - slices of any of the above, setting uniform arrays.
//!
//! Arrays of arrays are always matrices: to set an array of vectors, pass a slice of vectors.

use crate::backend::program::UniformValue;

/// Types that can be uploaded to a uniform.
pub trait Uniformable {
  /// View the value as flat uniform data.
  fn uniform_value(&self) -> UniformValue<'_>;
}

macro_rules! impl_uniformable_vector {
  ($t:ty, $variant:ident) => {
    impl Uniformable for $t {
      fn uniform_value(&self) -> UniformValue<'_> {
        UniformValue::$variant {
          components: 1,
          values: std::slice::from_ref(self),
        }
      }
    }

    impl Uniformable for [$t] {
      fn uniform_value(&self) -> UniformValue<'_> {
        UniformValue::$variant {
          components: 1,
          values: self,
        }
      }
    }

    impl_uniformable_vector!($t, $variant, 2);
    impl_uniformable_vector!($t, $variant, 3);
    impl_uniformable_vector!($t, $variant, 4);
  };

  ($t:ty, $variant:ident, $n:literal) => {
    impl Uniformable for [$t; $n] {
      fn uniform_value(&self) -> UniformValue<'_> {
        UniformValue::$variant {
          components: $n,
          values: self,
        }
      }
    }

    impl Uniformable for [[$t; $n]] {
      fn uniform_value(&self) -> UniformValue<'_> {
        UniformValue::$variant {
          components: $n,
          values: self.as_flattened(),
        }
      }
    }
  };
}

impl_uniformable_vector!(f32, Float);
impl_uniformable_vector!(i32, Int);
impl_uniformable_vector!(u32, UInt);
impl_uniformable_vector!(f64, Double);

macro_rules! impl_uniformable_matrix {
  ($t:ty, $variant:ident, $(($columns:literal, $rows:literal)),*) => {
    $(
      impl Uniformable for [[$t; $rows]; $columns] {
        fn uniform_value(&self) -> UniformValue<'_> {
          UniformValue::$variant {
            columns: $columns,
            rows: $rows,
            values: self[..].as_flattened(),
          }
        }
      }

      impl Uniformable for [[[$t; $rows]; $columns]] {
        fn uniform_value(&self) -> UniformValue<'_> {
          UniformValue::$variant {
            columns: $columns,
            rows: $rows,
            values: self.as_flattened().as_flattened(),
          }
        }
      }
    )*
  };
}

impl_uniformable_matrix!(
  f32,
  FloatMatrix,
  (2, 2),
  (2, 3),
  (2, 4),
  (3, 2),
  (3, 3),
  (3, 4),
  (4, 2),
  (4, 3),
  (4, 4)
);

impl_uniformable_matrix!(
  f64,
  DoubleMatrix,
  (2, 2),
  (2, 3),
  (2, 4),
  (3, 2),
  (3, 3),
  (3, 4),
  (4, 2),
  (4, 3),
  (4, 4)
);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn vectors() {
    assert_eq!(
      [1f32, 2., 3.].uniform_value(),
      UniformValue::Float {
        components: 3,
        values: &[1., 2., 3.]
      }
    );

    let positions: &[[i32; 2]] = &[[1, 2], [3, 4]];
    let value = positions.uniform_value();

    assert_eq!(value.count(), 2);
    assert_eq!(
      value,
      UniformValue::Int {
        components: 2,
        values: &[1, 2, 3, 4]
      }
    );
  }

  #[test]
  fn matrices_are_column_major() {
    let m = [[1f32, 2., 3.], [4., 5., 6.]];

    assert_eq!(
      m.uniform_value(),
      UniformValue::FloatMatrix {
        columns: 2,
        rows: 3,
        values: &[1., 2., 3., 4., 5., 6.]
      }
    );

    let ms: &[[[f64; 2]; 2]] = &[[[1., 0.], [0., 1.]]; 3];
    assert_eq!(ms.uniform_value().count(), 3);
  }
}
