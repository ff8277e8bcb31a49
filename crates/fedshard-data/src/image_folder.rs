// FolderDataset — directory-based image classification dataset
//
// Loads images from a directory structure where each subdirectory is a class:
//
//   root/
//     airplane/
//       img_001.png
//       img_002.png
//     automobile/
//       img_003.png
//       ...
//
// Class labels are assigned as sorted indices of subdirectory names, so the
// same tree always yields the same label mapping. CINIC-10 ships in exactly
// this layout, one such root per split.
//
// Decoding is lazy: `get` reads and decodes the file on demand, yielding
// channel-first [3, H, W] features with raw pixel values in [0, 255]. All
// images in one tree must share dimensions; the first image fixes them.
//
// Requires the `image-folder` feature (which brings in the `image` crate).

#[cfg(feature = "image-folder")]
pub use inner::*;

#[cfg(feature = "image-folder")]
mod inner {
    use std::path::{Path, PathBuf};

    use image::GenericImageView;

    use crate::dataset::{ClassId, Dataset, LabelSource, LabeledDataset, Sample};
    use crate::error::{Error, Result};

    /// Supported image extensions (case-insensitive).
    const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// A directory-based image classification dataset.
    #[derive(Debug)]
    pub struct FolderDataset {
        /// Sorted class names (subdirectory names).
        class_names: Vec<String>,
        /// Per-sample image paths.
        paths: Vec<PathBuf>,
        /// Per-sample class labels, parallel to `paths`.
        labels: Vec<ClassId>,
        /// Fixed [C, H, W] dimensions, probed from the first image.
        sample_dims: [usize; 3],
        dataset_name: String,
    }

    impl FolderDataset {
        /// Scan the directory tree and collect all image paths and labels.
        ///
        /// Fails if the root is not a directory, contains no class
        /// subdirectories, or contains no images; the first image is
        /// decoded up front to fix the sample dimensions.
        pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
            let root = root.as_ref();
            if !root.is_dir() {
                return Err(Error::NotADirectory(root.display().to_string()));
            }

            // Collect class subdirectories (sorted)
            let mut class_dirs: Vec<(String, PathBuf)> = Vec::new();
            for entry in std::fs::read_dir(root)? {
                let path = entry?.path();
                if path.is_dir() {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        class_dirs.push((name.to_string(), path));
                    }
                }
            }
            class_dirs.sort_by(|a, b| a.0.cmp(&b.0));

            if class_dirs.is_empty() {
                return Err(Error::NoClasses(root.display().to_string()));
            }

            let class_names: Vec<String> = class_dirs.iter().map(|(n, _)| n.clone()).collect();

            // Collect image paths per class
            let mut paths: Vec<PathBuf> = Vec::new();
            let mut labels: Vec<ClassId> = Vec::new();
            for (class_idx, (_name, dir)) in class_dirs.iter().enumerate() {
                let mut class_paths: Vec<PathBuf> = Vec::new();
                Self::collect_images(dir, &mut class_paths);
                class_paths.sort();
                for p in class_paths {
                    paths.push(p);
                    labels.push(class_idx);
                }
            }

            if paths.is_empty() {
                return Err(Error::NoImages(root.display().to_string()));
            }

            let (_, sample_dims) = decode_image(&paths[0])?;

            let dataset_name = root
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("folder")
                .to_string();

            Ok(FolderDataset {
                class_names,
                paths,
                labels,
                sample_dims,
                dataset_name,
            })
        }

        /// Recursively collect image files.
        fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) {
            if let Ok(rd) = std::fs::read_dir(dir) {
                for entry in rd.flatten() {
                    let path = entry.path();
                    if path.is_dir() {
                        Self::collect_images(&path, out);
                    } else if is_image(&path) {
                        out.push(path);
                    }
                }
            }
        }

        /// The class names (sorted).
        pub fn class_names(&self) -> &[String] {
            &self.class_names
        }

        /// Number of classes.
        pub fn num_classes(&self) -> usize {
            self.class_names.len()
        }

        /// Class label for the i-th sample.
        pub fn label(&self, index: usize) -> ClassId {
            self.labels[index]
        }
    }

    /// Decode an image into channel-first [0, 255] pixel values.
    fn decode_image(path: &Path) -> Result<(Vec<f64>, [usize; 3])> {
        let img = image::open(path)
            .map_err(|e| Error::ImageDecode(path.display().to_string(), e.to_string()))?;

        let (w, h) = img.dimensions();
        let rgb = img.to_rgb8();
        let raw = rgb.as_raw();

        // [H, W, C] interleaved to [C, H, W] planar
        let npix = (w * h) as usize;
        let mut data = vec![0.0f64; 3 * npix];
        for i in 0..npix {
            data[i] = raw[i * 3] as f64;
            data[npix + i] = raw[i * 3 + 1] as f64;
            data[2 * npix + i] = raw[i * 3 + 2] as f64;
        }

        Ok((data, [3, h as usize, w as usize]))
    }

    impl Dataset for FolderDataset {
        fn len(&self) -> usize {
            self.paths.len()
        }

        /// # Panics
        /// Panics if the image cannot be decoded or its dimensions differ
        /// from the rest of the tree. Unreadable data is a setup problem,
        /// not something to paper over with placeholder samples.
        fn get(&self, index: usize) -> Sample {
            let path = &self.paths[index];
            let (features, dims) = match decode_image(path) {
                Ok(decoded) => decoded,
                Err(e) => panic!("FolderDataset: {e}"),
            };
            if dims != self.sample_dims {
                panic!(
                    "FolderDataset: {} has dimensions {:?}, expected {:?}",
                    path.display(),
                    dims,
                    self.sample_dims
                );
            }

            Sample {
                features,
                feature_shape: dims.to_vec(),
                target: vec![self.labels[index] as f64],
                target_shape: vec![1],
            }
        }

        fn feature_shape(&self) -> &[usize] {
            &self.sample_dims
        }

        fn target_shape(&self) -> &[usize] {
            &[1]
        }

        fn name(&self) -> &str {
            &self.dataset_name
        }
    }

    impl LabeledDataset for FolderDataset {
        fn label_source(&self) -> LabelSource<'_> {
            LabelSource::Direct(&self.labels)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn write_png(path: &Path, w: u32, h: u32, value: u8) {
            let img = image::RgbImage::from_pixel(w, h, image::Rgb([value, 0, 255 - value]));
            img.save(path).unwrap();
        }

        fn build_tree(name: &str, classes: &[(&str, usize)]) -> PathBuf {
            let root = std::env::temp_dir().join(name);
            std::fs::remove_dir_all(&root).ok();
            for (class, count) in classes {
                let dir = root.join(class);
                std::fs::create_dir_all(&dir).unwrap();
                for i in 0..*count {
                    write_png(&dir.join(format!("img_{i}.png")), 4, 4, (i * 30) as u8);
                }
            }
            root
        }

        #[test]
        fn scan_assigns_sorted_class_labels() {
            let root = build_tree("fedshard_folder_sorted", &[("dog", 2), ("cat", 3)]);
            let ds = FolderDataset::scan(&root).unwrap();

            assert_eq!(ds.class_names(), &["cat".to_string(), "dog".to_string()]);
            assert_eq!(ds.len(), 5);
            // cat sorts first, so its 3 images carry label 0.
            assert_eq!(ds.class_labels(), vec![0, 0, 0, 1, 1]);

            std::fs::remove_dir_all(&root).ok();
        }

        #[test]
        fn get_decodes_channel_first() {
            let root = build_tree("fedshard_folder_decode", &[("a", 1)]);
            let ds = FolderDataset::scan(&root).unwrap();

            let s = ds.get(0);
            assert_eq!(s.feature_shape, vec![3, 4, 4]);
            assert_eq!(s.features.len(), 48);
            // Red plane is `value` (0), blue plane is 255 - value.
            assert_eq!(s.features[0], 0.0);
            assert_eq!(s.features[32], 255.0);
            assert_eq!(s.target, vec![0.0]);

            std::fs::remove_dir_all(&root).ok();
        }

        #[test]
        fn empty_root_rejected() {
            let root = std::env::temp_dir().join("fedshard_folder_empty");
            std::fs::remove_dir_all(&root).ok();
            std::fs::create_dir_all(&root).unwrap();

            let err = FolderDataset::scan(&root).unwrap_err();
            assert!(matches!(err, Error::NoClasses(_)));

            std::fs::remove_dir_all(&root).ok();
        }

        #[test]
        fn missing_root_rejected() {
            let root = std::env::temp_dir().join("fedshard_folder_nonexistent");
            std::fs::remove_dir_all(&root).ok();
            let err = FolderDataset::scan(&root).unwrap_err();
            assert!(matches!(err, Error::NotADirectory(_)));
        }

        #[test]
        fn classless_images_rejected() {
            let root = std::env::temp_dir().join("fedshard_folder_noimages");
            std::fs::remove_dir_all(&root).ok();
            std::fs::create_dir_all(root.join("empty_class")).unwrap();

            let err = FolderDataset::scan(&root).unwrap_err();
            assert!(matches!(err, Error::NoImages(_)));

            std::fs::remove_dir_all(&root).ok();
        }
    }
}
