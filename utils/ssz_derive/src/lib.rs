#![recursion_limit = "256"]

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields};

#[proc_macro_derive(SszEncode, attributes(ssz))]
pub fn encode_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("AST should be correct");

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = &ast.generics.split_for_impl();
    let fields = get_serializable_fields(&ast.data);

    let fields_count = fields.len();

    let mut fixed_parts_pushes = Vec::with_capacity(fields_count);
    let mut variable_parts_pushes = Vec::with_capacity(fields_count);
    let mut is_fixed_lens = Vec::with_capacity(fields_count);
    let mut bytes_len_terms = Vec::with_capacity(fields_count);
    let mut fixed_lengths = Vec::with_capacity(fields_count);
    for field in &fields {
        let field_type = &field.ty;
        let field_name = match &field.ident {
            Some(ident) => ident,
            _ => panic!("All fields must have names"),
        };

        fixed_parts_pushes.push(quote! {
            fixed_parts.push(if <#field_type as ssz::SszEncode>::is_ssz_fixed_len() {
                Some(self.#field_name.as_ssz_bytes())
            } else {
                None
            });
        });

        variable_parts_pushes.push(quote! {
            variable_parts.push(if <#field_type as ssz::SszEncode>::is_ssz_fixed_len() {
                vec![]
            } else {
                self.#field_name.as_ssz_bytes()
            });
        });

        is_fixed_lens.push(quote! {
            <#field_type as ssz::SszEncode>::is_ssz_fixed_len()
        });

        bytes_len_terms.push(quote! {
            if <#field_type as ssz::SszEncode>::is_ssz_fixed_len() {
                <#field_type as ssz::SszEncode>::ssz_fixed_len()
            } else {
                ssz::BYTES_PER_LENGTH_OFFSET
                    + ssz::SszEncode::ssz_bytes_len(&self.#field_name)
            }
        });

        fixed_lengths.push(quote! {
            <#field_type as ssz::SszEncode>::ssz_fixed_len()
        });
    }

    let generated = quote! {
        impl #impl_generics ssz::SszEncode for #name #ty_generics #where_clause {
            fn as_ssz_bytes(&self) -> Vec<u8> {
                let fields_count = #fields_count;

                let mut fixed_parts = Vec::with_capacity(fields_count);
                #(
                    #fixed_parts_pushes
                )*

                let mut variable_parts = Vec::with_capacity(fields_count);
                #(
                    #variable_parts_pushes
                )*

                ssz::encode_items_from_parts(&fixed_parts, &variable_parts)
            }

            fn is_ssz_fixed_len() -> bool {
                #(
                    #is_fixed_lens &&
                )*
                    true
            }

            fn ssz_bytes_len(&self) -> usize {
                0 #(
                    + (#bytes_len_terms)
                )*
            }

            fn ssz_fixed_len() -> usize {
                if <Self as ssz::SszEncode>::is_ssz_fixed_len() {
                    #(
                        #fixed_lengths +
                    )*
                    0
                } else {
                    ssz::BYTES_PER_LENGTH_OFFSET
                }
            }
        }
    };

    generated.into()
}

#[proc_macro_derive(SszDecode, attributes(ssz))]
pub fn decode_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("AST should be correct");

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = &ast.generics.split_for_impl();
    let fields = get_all_fields(&ast.data);

    let fields_count = fields.len();

    let mut next_types = Vec::with_capacity(fields_count);
    let mut fields_initialization = Vec::with_capacity(fields_count);
    let mut is_fixed_lens = Vec::with_capacity(fields_count);
    let mut fixed_lengths = Vec::with_capacity(fields_count);
    for field in &fields {
        let field_type = &field.ty;
        let field_name = match &field.ident {
            Some(ident) => ident,
            _ => panic!("All fields must have names"),
        };

        if should_skip_deserialization(field) {
            fields_initialization.push(quote! {
                #field_name: <_>::default()
            });
        } else {
            next_types.push(quote! {
                decoder.next_type::<#field_type>()?
            });

            fields_initialization.push(quote! {
                #field_name: decoder.deserialize_next::<#field_type>()?
            });

            is_fixed_lens.push(quote! {
                <#field_type as ssz::SszDecode>::is_ssz_fixed_len()
            });

            fixed_lengths.push(quote! {
               <#field_type as ssz::SszDecode>::ssz_fixed_len()
            });
        }
    }

    let generated = quote! {
        impl #impl_generics ssz::SszDecode for #name #ty_generics #where_clause {
            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, ssz::SszDecodeError> {
                if <Self as ssz::SszDecode>::is_ssz_fixed_len()
                    && bytes.len() != <Self as ssz::SszDecode>::ssz_fixed_len()
                {
                    return Err(ssz::SszDecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: <Self as ssz::SszDecode>::ssz_fixed_len(),
                    });
                }

                let mut decoder = ssz::Decoder::for_bytes(bytes);

                #(
                    #next_types;
                )*

                decoder.finalize()?;

                Ok(Self {
                    #(
                        #fields_initialization,
                    )*
                })
            }

            fn is_ssz_fixed_len() -> bool {
                #(
                    #is_fixed_lens &&
                )*
                    true
            }

            fn ssz_fixed_len() -> usize {
                if <Self as ssz::SszDecode>::is_ssz_fixed_len() {
                    #(
                        #fixed_lengths +
                    )*
                    0
                } else {
                    ssz::BYTES_PER_LENGTH_OFFSET
                }
            }
        }
    };

    generated.into()
}

/// Containers merkleise the tuple of their field roots.
#[proc_macro_derive(TreeHash, attributes(ssz))]
pub fn tree_hash_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("AST should be correct");

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = &ast.generics.split_for_impl();
    let fields = get_serializable_fields(&ast.data);

    let fields_count = fields.len();

    let mut root_pushes = Vec::with_capacity(fields_count);
    for field in &fields {
        let field_name = match &field.ident {
            Some(ident) => ident,
            _ => panic!("All fields must have names"),
        };

        root_pushes.push(quote! {
            roots.push(ssz::TreeHash::tree_hash_root(&self.#field_name));
        });
    }

    let generated = quote! {
        impl #impl_generics ssz::TreeHash for #name #ty_generics #where_clause {
            fn tree_hash_type() -> ssz::TreeHashType {
                ssz::TreeHashType::Container
            }

            fn tree_hash_packed_encoding(&self) -> Vec<u8> {
                unreachable!("containers are not packed")
            }

            fn tree_hash_packing_factor() -> usize {
                unreachable!("containers are not packed")
            }

            fn tree_hash_root(&self) -> ethereum_types::H256 {
                let mut roots = Vec::with_capacity(#fields_count);
                #(
                    #root_pushes
                )*
                ssz::merkleize_chunks(&roots, #fields_count)
            }
        }
    };

    generated.into()
}

fn get_serializable_fields(data: &Data) -> Vec<&Field> {
    extract_fields(data)
        .iter()
        .filter(|f| !should_skip_serialization(f))
        .collect()
}

fn get_all_fields(data: &Data) -> Vec<&Field> {
    extract_fields(data).iter().collect()
}

fn should_skip_serialization(field: &Field) -> bool {
    field.attrs.iter().any(|attr| {
        attr.path.is_ident("ssz")
            && attr.tokens.to_string().replace(' ', "") == "(skip_serializing)"
    })
}

fn should_skip_deserialization(field: &Field) -> bool {
    field.attrs.iter().any(|attr| {
        attr.path.is_ident("ssz")
            && attr.tokens.to_string().replace(' ', "") == "(skip_deserializing)"
    })
}

fn extract_fields(data: &Data) -> &Fields {
    match data {
        syn::Data::Struct(struct_data) => &struct_data.fields,
        _ => panic!("Serialization only available for structs"),
    }
}
