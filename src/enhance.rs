use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Comment, Image, Product};

/// Group `comments` by owning product and hand each product its group. A
/// product without comments keeps the field unset. The index is built once,
/// so the cost is linear in the number of comments.
pub fn attach_comments(products: &mut [Product], comments: Vec<Comment>) {
    let mut by_product: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_product
            .entry(comment.product_id)
            .or_default()
            .push(comment);
    }
    for product in products {
        product.comments = by_product.remove(&product.id);
    }
}

/// Group `images` by owning product, attach each group and pick a thumbnail:
/// the first image flagged main, else the first image of the group, else
/// unset.
pub fn attach_images(products: &mut [Product], images: Vec<Image>) {
    let mut by_product: HashMap<Uuid, Vec<Image>> = HashMap::new();
    for image in images {
        by_product.entry(image.product_id).or_default().push(image);
    }
    for product in products {
        let group = by_product.remove(&product.id);
        product.thumbnail = group
            .as_ref()
            .and_then(|images| {
                images
                    .iter()
                    .find(|image| image.main)
                    .or_else(|| images.first())
            })
            .cloned();
        product.images = group;
    }
}
