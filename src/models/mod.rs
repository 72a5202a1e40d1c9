pub mod devicemodel;
pub mod jobmodel;
pub mod paymentmodel;
pub mod pointsmodel;
pub mod taskmodel;
pub mod usermodel;
