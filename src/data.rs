use crate::errors::PipelineError;

/// Contiguous Column Major Matrix data container.
///
/// This structure borrows a dense matrix of values stored in a single contiguous
/// memory block, column after column (Fortran-style), which allows for
/// efficient column slicing when binning features.
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Indices into the data row-wise.
    pub index: Vec<usize>,
    /// Number of rows in the matrix.
    pub rows: usize,
    /// Number of columns in the matrix.
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    /// Create a new column major Matrix.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix {
            data,
            index: (0..rows).collect(),
            rows,
            cols,
        }
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[j * self.rows + i]
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }
}

/// Owned, named, all-numeric table stored column major.
///
/// Missing values are `NaN`. This is the form the encoders hand to the
/// imputer, and the imputer hands to the boosters.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericFrame {
    pub names: Vec<String>,
    pub data: Vec<f64>,
    pub rows: usize,
}

impl NumericFrame {
    /// Build a frame from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self, PipelineError> {
        let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(rows * columns.len());
        for (name, column) in columns {
            if column.len() != rows {
                return Err(PipelineError::InvalidParameter(
                    name,
                    format!("a column of {} rows", rows),
                    format!("{} rows", column.len()),
                ));
            }
            names.push(name);
            data.extend(column);
        }
        Ok(NumericFrame { names, data, rows })
    }

    pub fn cols(&self) -> usize {
        self.names.len()
    }

    pub fn column(&self, col: usize) -> &[f64] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    pub fn column_mut(&mut self, col: usize) -> &mut [f64] {
        &mut self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Borrow the frame as a matrix for the boosters.
    pub fn as_matrix(&self) -> Matrix<'_, f64> {
        Matrix::new(&self.data, self.rows, self.cols())
    }

    /// Fail unless `names` lists exactly this frame's columns, in order.
    pub fn check_names(&self, names: &[String]) -> Result<(), PipelineError> {
        if self.names != names {
            return Err(PipelineError::SchemaMismatch(self.names.join(", "), names.join(", ")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_column_major() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let m = Matrix::new(&v, 3, 2);
        assert_eq!(m.get(0, 1), &4.0);
        assert_eq!(m.get(2, 0), &3.0);
        assert_eq!(m.get_col(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_frame_from_columns() {
        let frame = NumericFrame::from_columns(vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![3.0, 4.0]),
        ])
        .unwrap();
        assert_eq!(frame.rows, 2);
        assert_eq!(frame.column(1), &[3.0, 4.0]);
        assert_eq!(*frame.as_matrix().get(1, 0), 2.0);
        assert!(frame.check_names(&["a".to_string(), "b".to_string()]).is_ok());
        assert!(frame.check_names(&["b".to_string(), "a".to_string()]).is_err());
    }

    #[test]
    fn test_frame_ragged_columns() {
        let res = NumericFrame::from_columns(vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![3.0]),
        ]);
        assert!(matches!(res, Err(PipelineError::InvalidParameter(..))));
    }
}
