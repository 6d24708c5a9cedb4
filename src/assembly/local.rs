use crate::grid::{Grid, Point2D};
use axires_traits::Real;
use eyre::eyre;
use nalgebra::{Matrix2, Matrix4, Vector4};
use numeric_literals::replace_float_literals;

/// Stiffness matrix of a bilinear rectangular element for the axisymmetric Laplacian
/// `-∇·(r ∇u)`, with unit conductivity.
///
/// The element spans `[r0, r0 + length] x [z0, z0 + height]`. Since the weak form separates in
/// `r` and `z`, the matrix is the tensor combination
///
/// ```text
/// K = S_r ⊗ M_z + M_r ⊗ S_z
/// ```
///
/// of the one-dimensional stiffness matrices `S_r` (weighted by `r`) and `S_z`, and the
/// one-dimensional mass matrices `M_r` (weighted by `r`) and `M_z`. Local node `i` uses the
/// one-dimensional basis function `i % 2` along r and `i / 2` along z.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn axisymmetric_stiffness<T: Real>(r0: T, length: T, height: T) -> Matrix4<T> {
    let stiffness = Matrix2::new(1.0, -1.0, -1.0, 1.0);
    let mass = Matrix2::new(2.0, 1.0, 1.0, 2.0);
    let weighted_mass = Matrix2::new(1.0, 1.0, 1.0, 3.0);

    let stiffness_r = stiffness * ((2.0 * r0 + length) / (2.0 * length));
    let stiffness_z = stiffness / height;
    let mass_r = weighted_mass * (length * length / 12.0) + mass * (length * r0 / 6.0);
    let mass_z = mass * (height / 6.0);

    let mut k = Matrix4::zeros();
    for i in 0..4 {
        let (mu_i, nu_i) = (i % 2, i / 2);
        for j in 0..=i {
            let (mu_j, nu_j) = (j % 2, j / 2);
            let k_ij = stiffness_r[(mu_i, mu_j)] * mass_z[(nu_i, nu_j)]
                + mass_r[(mu_i, mu_j)] * stiffness_z[(nu_i, nu_j)];
            k[(i, j)] = k_ij;
            k[(j, i)] = k_ij;
        }
    }
    k
}

/// The stiffness matrix of an element of the grid, scaled by the conductivity of its material.
pub fn element_stiffness<T: Real>(grid: &Grid<T>, element_index: usize, conductivities: &[T]) -> eyre::Result<Matrix4<T>> {
    let element = grid
        .elements()
        .get(element_index)
        .ok_or_else(|| eyre!("element {} does not exist", element_index))?;
    let sigma = conductivities.get(element.material()).copied().ok_or_else(|| {
        eyre!(
            "element {} has material {}, but only {} conductivities are given",
            element_index,
            element.material(),
            conductivities.len()
        )
    })?;
    let r0 = grid.nodes()[element.nodes()[0]].r;
    Ok(axisymmetric_stiffness(r0, element.length(), element.height()) * sigma)
}

/// Values of the four bilinear basis functions of the element with the given lower-left corner
/// and extents at `point`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn bilinear_basis<T: Real>(lower_left: &Point2D<T>, length: T, height: T, point: &Point2D<T>) -> Vector4<T> {
    let xi = (point.r - lower_left.r) / length;
    let eta = (point.z - lower_left.z) / height;
    Vector4::new(
        (1.0 - xi) * (1.0 - eta),
        xi * (1.0 - eta),
        (1.0 - xi) * eta,
        xi * eta,
    )
}
